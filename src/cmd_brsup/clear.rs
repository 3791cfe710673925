use clap::*;
use lazy_static::lazy_static;
use regex::Regex;
use std::io::Write;

use brsup::libs::phylo::reader::TreeReader;

lazy_static! {
    // Internal node labels written by `support`: "0.97/0.0030"
    static ref RE_SUP_PVAL: Regex = Regex::new(r"^(-?\d+\.\d+)/-?\d+\.\d+$").unwrap();
}

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("clear")
        .about("Clear supports or p-values from input trees")
        .after_help(
            r###"
Removes support annotations from a stream of trees.

Notes:
* `pvalues` rewrites internal node labels of the form `support/pvalue`
  (as written by `brsup support`) to keep only the support part.
* `supports` removes the support value from every branch.

Examples:
1. Keep supports, drop p-values:
   brsup clear pvalues trees.nwk

2. Drop branch supports:
   brsup clear supports trees.nwk -o out.nwk

"###,
        )
        .arg(
            Arg::new("what")
                .required(true)
                .num_args(1)
                .index(1)
                .value_parser(["pvalues", "supports"])
                .help("What to clear"),
        )
        .arg(
            Arg::new("infile")
                .num_args(1)
                .index(2)
                .default_value("stdin")
                .help("Input filename. [stdin] for standard input"),
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
    let what = args.get_one::<String>("what").unwrap();
    let infile = args.get_one::<String>("infile").unwrap();
    let mut writer = brsup::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Operating
    //----------------------------
    for tree in TreeReader::from_file(infile) {
        let mut tree = tree?;

        match what.as_str() {
            "pvalues" => {
                for node in tree.nodes_mut() {
                    let stripped = RE_SUP_PVAL
                        .captures(&node.name)
                        .map(|caps| caps[1].to_string());
                    if let Some(name) = stripped {
                        node.name = name;
                    }
                }
            }
            "supports" => {
                for edge in tree.edges_mut() {
                    edge.support = None;
                }
            }
            _ => unreachable!(),
        }

        writer.write_all((tree.to_newick() + "\n").as_ref())?;
    }

    Ok(())
}
