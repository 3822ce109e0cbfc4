//! Command-line interface definition.
use std::path::PathBuf;

use clap::Parser;

use crate::lifecycle::DesiredState;

/// Build version: `FIREFOX_PROFILES_VERSION` when set at build time, else the crate version.
pub(crate) const VERSION: &str = match option_env!("FIREFOX_PROFILES_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Ensure a Firefox profile is present or absent.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "firefox-profile",
    about = "Idempotently create or remove Firefox profiles",
    version = VERSION
)]
pub struct Cli {
    /// Profile name (omit to target the default profile)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Profiles root directory containing profiles.ini
    #[arg(short, long, default_value = "~/.mozilla/firefox")]
    pub path: PathBuf,

    /// Desired state of the profile
    #[arg(short, long, value_enum, default_value_t = DesiredState::Present)]
    pub state: DesiredState,

    /// Browser executable used for initialization and profile creation
    #[arg(long, default_value = "firefox")]
    pub firefox: String,

    /// Seconds to wait for first-run initialization before killing the browser
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Preview changes without applying
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}
