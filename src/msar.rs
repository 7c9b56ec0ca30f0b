extern crate clap;
use clap::*;

mod cmd_msar;

fn main() -> anyhow::Result<()> {
    let app = Command::new("msar")
        .version(crate_version!())
        .about("`msar` refines blocked multiple sequence alignments")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_msar::maf2fas::make_subcommand())
        .subcommand(cmd_msar::refine::make_subcommand())
        .after_help(
            r###"
Subcommand groups:

* conversion: maf2fas
* refinement: refine

"###,
        );

    // Check which subcommand the user ran...
    match app.get_matches().subcommand() {
        Some(("maf2fas", sub_matches)) => cmd_msar::maf2fas::execute(sub_matches),
        Some(("refine", sub_matches)) => cmd_msar::refine::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
