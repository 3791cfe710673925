use clap::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

use brsup::libs::support::{compute_support, ParsimonySupporter};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("support")
        .about("Compute parsimony-based branch supports from bootstrap trees")
        .after_help(
            r###"
Compares a reference tree against a file of bootstrap replicate trees and
writes a support value on every internal branch.

Notes:
* The first argument is the reference tree, the second the replicates
  (one Newick tree per line, or `;`-concatenated).
* For each internal branch, the right node is renamed `support/pvalue`
  (two and four decimals) and the branch support is set accordingly.
* The null model is analytic by default; `--empirical` estimates it from
  ten tip-shuffled copies of the reference tree instead.
* All trees must share the same set of tip names.

Examples:
1. Analytic null model, four threads:
   brsup support ref.nwk boot.nwk -t 4

2. Empirical null model with a fixed seed:
   brsup support ref.nwk boot.nwk --empirical --seed 11

"###,
        )
        .arg(
            Arg::new("ref")
                .required(true)
                .num_args(1)
                .index(1)
                .help("Reference tree file"),
        )
        .arg(
            Arg::new("boot")
                .required(true)
                .num_args(1)
                .index(2)
                .help("Bootstrap trees file"),
        )
        .arg(
            Arg::new("empirical")
                .long("empirical")
                .short('e')
                .action(ArgAction::SetTrue)
                .help("Estimate the null model from tip-shuffled trees"),
        )
        .arg(
            Arg::new("threads")
                .long("threads")
                .short('t')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("1")
                .help("Number of worker threads (clamped to available CPUs)"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .short('s')
                .value_parser(value_parser!(u64))
                .num_args(1)
                .default_value("42")
                .help("Seed for the tip shuffles of the empirical null"),
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
    let ref_file = args.get_one::<String>("ref").unwrap();
    let boot_file = args.get_one::<String>("boot").unwrap();
    let empirical = args.get_flag("empirical");
    let threads = *args.get_one::<usize>("threads").unwrap();
    let seed = *args.get_one::<u64>("seed").unwrap();
    let mut writer = brsup::writer(args.get_one::<String>("outfile").unwrap());

    //----------------------------
    // Operating
    //----------------------------
    let mut rng = StdRng::seed_from_u64(seed);
    let mut supporter = ParsimonySupporter::new();
    let tree = compute_support(
        ref_file,
        boot_file,
        empirical,
        threads,
        &mut supporter,
        &mut rng,
    )?;

    //----------------------------
    // Output
    //----------------------------
    writer.write_all((tree.to_newick() + "\n").as_ref())?;

    Ok(())
}
