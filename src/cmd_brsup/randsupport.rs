use clap::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

use brsup::libs::phylo::reader::TreeReader;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("randsupport")
        .about("Assign a random support to branches of input trees")
        .after_help(
            r###"
Assigns a uniform [0,1) support to every internal branch of the input
trees. Tip branches are left untouched.

Examples:
1. brsup randsupport trees.nwk --seed 7 -o out.nwk

"###,
        )
        .arg(
            Arg::new("infile")
                .num_args(1)
                .index(1)
                .default_value("stdin")
                .help("Input filename. [stdin] for standard input"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .short('s')
                .value_parser(value_parser!(u64))
                .num_args(1)
                .default_value("42")
                .help("Initial random seed"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let infile = args.get_one::<String>("infile").unwrap();
    let seed = *args.get_one::<u64>("seed").unwrap();
    let mut writer = brsup::writer(args.get_one::<String>("outfile").unwrap());

    let mut rng = StdRng::seed_from_u64(seed);

    //----------------------------
    // Operating
    //----------------------------
    for tree in TreeReader::from_file(infile) {
        let mut tree = tree?;

        let internal: Vec<usize> = tree
            .edges()
            .iter()
            .filter(|e| !tree.is_tip(e.right))
            .map(|e| e.id)
            .collect();
        for eid in internal {
            tree.edges_mut()[eid].support = Some(rng.gen_range(0.0..1.0));
        }

        writer.write_all((tree.to_newick() + "\n").as_ref())?;
    }

    Ok(())
}
