//! Validated run configuration.
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::error::{ProfileError, Result};
use crate::lifecycle::DesiredState;
use crate::registry::expand_tilde;

/// Everything one reconciliation run needs, resolved from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Profiles root (tilde-expanded).
    pub root: PathBuf,
    /// Desired profile state.
    pub state: DesiredState,
    /// Target profile; `None` means the default profile.
    pub name: Option<String>,
    /// Browser executable name or path.
    pub browser: String,
    /// Time budget for first-run initialization.
    pub first_run_timeout: Duration,
    /// Report without applying.
    pub dry_run: bool,
}

impl Settings {
    /// Build settings from parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile name is invalid or `~` cannot be expanded.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let name = cli
            .name
            .as_deref()
            .map(validate_name)
            .transpose()?
            .map(str::to_string);

        Ok(Self {
            root: expand_tilde(&cli.path)?,
            state: cli.state,
            name,
            browser: cli.firefox.clone(),
            first_run_timeout: Duration::from_secs(cli.timeout_secs),
            dry_run: cli.dry_run,
        })
    }
}

/// Check that `name` can match a registry entry.
///
/// Registry values are stored trimmed, so names with surrounding whitespace
/// never match.
///
/// # Errors
///
/// Returns [`ProfileError::InvalidName`] for empty names or names with
/// leading/trailing whitespace.
pub fn validate_name(name: &str) -> Result<&str> {
    if name.trim().is_empty() {
        return Err(ProfileError::InvalidName {
            name: name.to_string(),
            reason: "must not be empty",
        });
    }
    if name.trim() != name {
        return Err(ProfileError::InvalidName {
            name: name.to_string(),
            reason: "must not start or end with whitespace",
        });
    }
    Ok(name)
}
