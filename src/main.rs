//! `firefox-profile` binary: reconcile one profile and print the result as JSON.
use std::io::Write as _;

use anyhow::Result;
use clap::Parser;

use firefox_profiles::{cli, commands, logging};

fn main() -> Result<()> {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = cli::Cli::parse();
    logging::init_subscriber(args.verbose);

    let outcome = commands::ensure::run(&args)?;

    let mut stdout = std::io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, &outcome)?;
    writeln!(stdout)?;
    Ok(())
}
