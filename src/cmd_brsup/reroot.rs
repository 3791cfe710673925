use clap::*;
use std::io::Write;

use brsup::libs::phylo::reader::TreeReader;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("reroot")
        .about("Reroot trees on a named node or the first trifurcation")
        .after_help(
            r###"
Reroots every input tree and re-orients all branches accordingly.

Notes:
* With `--node`, the tree is rerooted on the first node carrying that
  name (which may be a tip).
* Without `--node`, the tree is rerooted on the first node having three
  neighbors; trees without any trifurcation are rejected.

Examples:
1. brsup reroot trees.nwk -n Homo
2. brsup reroot trees.nwk -o rerooted.nwk

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
            Arg::new("node")
                .long("node")
                .short('n')
                .num_args(1)
                .help("Name of the new root node"),
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
    let node_name = args.get_one::<String>("node");
    let mut writer = brsup::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Operating
    //----------------------------
    for tree in TreeReader::from_file(infile) {
        let mut tree = tree?;

        match node_name {
            Some(name) => {
                let id = tree
                    .get_node_by_name(name)
                    .ok_or_else(|| anyhow::anyhow!("no node named {:?} in the tree", name))?;
                tree.reroot(id)?;
            }
            None => tree.reroot_first()?,
        }

        writer.write_all((tree.to_newick() + "\n").as_ref())?;
    }

    Ok(())
}
