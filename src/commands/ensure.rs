//! Ensure a profile is present or absent.
//!
//! Wires [`Settings`] to a [`ProfileRegistry`], the real browser and
//! filesystem, and a [`Reconciler`].
use anyhow::{Context as _, Result};

use crate::browser::{Browser, Firefox};
use crate::cli::{Cli, VERSION};
use crate::config::Settings;
use crate::exec::SystemExecutor;
use crate::lifecycle::{Outcome, Reconciler};
use crate::logging::STAGE;
use crate::operations::{FileSystemOps, SystemFileSystemOps};
use crate::registry::ProfileRegistry;

/// Run the ensure command against the real browser and filesystem.
///
/// # Errors
///
/// Returns an error if the arguments are invalid or reconciliation fails.
pub fn run(cli: &Cli) -> Result<Outcome> {
    let settings = Settings::from_cli(cli)?;
    let executor = SystemExecutor;
    let browser = Firefox::new(settings.browser.clone(), &executor);
    run_with(&settings, &browser, &SystemFileSystemOps)
}

/// Run the ensure command with injected capabilities.
///
/// # Errors
///
/// Returns an error if the registry cannot be loaded, a capability fails,
/// or the registry cannot be written back.
pub fn run_with(
    settings: &Settings,
    browser: &dyn Browser,
    fs_ops: &dyn FileSystemOps,
) -> Result<Outcome> {
    tracing::debug!("firefox-profile {VERSION}");

    tracing::info!(target: STAGE, "Loading profile registry");
    let mut registry = ProfileRegistry::open(&settings.root).with_context(|| {
        format!("loading profile registry under {}", settings.root.display())
    })?;
    tracing::info!(
        "{} profile(s) in {}",
        registry.profiles().count(),
        registry.ini_path().display()
    );

    let target = settings.name.as_deref().unwrap_or("default");
    let mut reconciler = Reconciler::new(&mut registry, browser, fs_ops)
        .with_first_run_timeout(settings.first_run_timeout)
        .with_dry_run(settings.dry_run);
    let outcome = reconciler
        .reconcile(settings.state, settings.name.as_deref())
        .with_context(|| format!("ensuring {target} profile is {:?}", settings.state))?;

    if outcome.changed {
        tracing::info!("changed");
    } else {
        tracing::info!("already up to date");
    }
    Ok(outcome)
}
