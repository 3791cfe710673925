use clap::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

use brsup::libs::phylo::tree::ops;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("generate")
        .about("Generate a random binary tree")
        .after_help(
            r###"
Generates an unrooted binary tree by repeatedly grafting tips on a
uniformly chosen branch. Every internal node has degree three; the tree
is rooted on its first trifurcation for output.

Notes:
* At least 3 tips are required.

Examples:
1. brsup generate --tips 20 --seed 7

"###,
        )
        .arg(
            Arg::new("tips")
                .long("tips")
                .short('n')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("10")
                .help("Number of tips of the generated tree"),
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
    let tips = *args.get_one::<usize>("tips").unwrap();
    let seed = *args.get_one::<u64>("seed").unwrap();
    let mut writer = brsup::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Operating
    //----------------------------
    let mut rng = StdRng::seed_from_u64(seed);
    let tree = ops::random_binary_tree(&mut rng, tips)?;

    writer.write_all((tree.to_newick() + "\n").as_ref())?;

    Ok(())
}
