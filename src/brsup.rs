extern crate clap;
use clap::*;

mod cmd_brsup;

fn main() -> anyhow::Result<()> {
    let app = Command::new("brsup")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`brsup` - Bootstrap Replicate SUPports")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_brsup::support::make_subcommand())
        .subcommand(cmd_brsup::clear::make_subcommand())
        .subcommand(cmd_brsup::randsupport::make_subcommand())
        .subcommand(cmd_brsup::sample::make_subcommand())
        .subcommand(cmd_brsup::generate::make_subcommand())
        .subcommand(cmd_brsup::reroot::make_subcommand())
        .after_help(
            r###"
Manipulates phylogenetic trees in Newick format and computes per-branch
statistical supports from bootstrap replicates.

Subcommand groups:

* Supports:
    * support / clear / randsupport

* Trees:
    * generate / reroot / sample

"###,
        );

    // Check which subcomamnd the user ran...
    match app.get_matches().subcommand() {
        Some(("support", sub_matches)) => cmd_brsup::support::execute(sub_matches),
        Some(("clear", sub_matches)) => cmd_brsup::clear::execute(sub_matches),
        Some(("randsupport", sub_matches)) => cmd_brsup::randsupport::execute(sub_matches),
        Some(("sample", sub_matches)) => cmd_brsup::sample::execute(sub_matches),
        Some(("generate", sub_matches)) => cmd_brsup::generate::execute(sub_matches),
        Some(("reroot", sub_matches)) => cmd_brsup::reroot::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
