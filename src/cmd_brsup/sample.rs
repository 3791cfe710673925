use clap::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

use brsup::libs::phylo::reader::TreeReader;
use brsup::libs::phylo::Tree;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("sample")
        .about("Take a subsample of the set of trees from the input file")
        .after_help(
            r###"
Takes a subsample of the set of trees from the input file.

It can be with or without replacement depending on the presence of the
`--replace` option.

If the number of desired trees is greater than the number of input trees:
* with `--replace`: will still output -n trees
* without `--replace`: will output all input trees

Notes:
* Without replacement this is standard reservoir sampling; a single pass,
  so the input may be piped.
* With replacement this is the naive reservoir scheme of
  https://doi.org/10.1016/j.csda.2007.03.010

Examples:
1. brsup sample boot.nwk -n 100 --seed 11
2. brsup sample boot.nwk -n 100 --replace -o sub.nwk

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
            Arg::new("num")
                .long("num")
                .short('n')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("1")
                .help("Number of trees to sample from the input file"),
        )
        .arg(
            Arg::new("replace")
                .long("replace")
                .action(ArgAction::SetTrue)
                .help("Sample with replacement"),
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
    let num = *args.get_one::<usize>("num").unwrap();
    let replace = args.get_flag("replace");
    let seed = *args.get_one::<u64>("seed").unwrap();
    let mut writer = brsup::writer(args.get_one::<String>("outfile").unwrap());

    let mut rng = StdRng::seed_from_u64(seed);

    //----------------------------
    // Operating
    //----------------------------
    let mut out: Vec<Tree> = Vec::with_capacity(num);
    let mut total = 0usize;

    if !replace {
        // Standard reservoir sampling
        for tree in TreeReader::from_file(infile) {
            let tree = tree?;
            if total < num {
                out.push(tree);
            } else {
                let j = rng.gen_range(0..=total);
                if j < num {
                    out[j] = tree;
                }
            }
            total += 1;
        }
    } else {
        // Naive reservoir sampling with replacement: each slot is
        // replaced by the m-th tree with probability 1/m
        for tree in TreeReader::from_file(infile) {
            let tree = tree?;
            total += 1;
            if total == 1 {
                out = vec![tree; num];
            } else {
                for slot in out.iter_mut() {
                    if rng.gen_range(0..total) == 0 {
                        *slot = tree.clone();
                    }
                }
            }
        }
    }

    //----------------------------
    // Output
    //----------------------------
    for tree in &out {
        writer.write_all((tree.to_newick() + "\n").as_ref())?;
    }

    Ok(())
}
