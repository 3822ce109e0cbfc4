//! Idempotent reconciliation of a profile towards a desired state.
//!
//! | state     | name   | registry                 | action                                   | changed |
//! |-----------|--------|--------------------------|------------------------------------------|---------|
//! | `present` | none   | default profile exists   | report it                                | no      |
//! | `present` | none   | no default profile       | first-run initialization, refresh        | yes     |
//! | `present` | given  | profile exists           | report it                                | no      |
//! | `present` | given  | profile missing          | create profile, refresh                  | yes     |
//! | `absent`  | given  | profile exists           | remove directory, then section           | yes     |
//! | `absent`  | any    | profile missing / none   | nothing                                  | no      |
//! | `absent`  | given  | path holds the root      | refuse with `UnsafeProfilePath`          | error   |
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::browser::{Browser, FirstRun};
use crate::error::{ProfileError, Result};
use crate::logging::{DRY_RUN, STAGE};
use crate::operations::FileSystemOps;
use crate::registry::ProfileRegistry;

/// Default time budget for first-run initialization.
pub const DEFAULT_FIRST_RUN_TIMEOUT: Duration = Duration::from_secs(10);

/// Desired state of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DesiredState {
    /// The profile must exist.
    #[default]
    Present,
    /// The profile must not exist.
    Absent,
}

/// Result record of one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Whether anything was (or, in dry-run mode, would be) changed.
    pub changed: bool,
    /// The profile the run acted on or reported.
    pub profile_name: Option<String>,
    /// Directory of that profile, when known.
    pub profile_path: Option<PathBuf>,
}

impl Outcome {
    const fn unchanged(profile_name: Option<String>, profile_path: Option<PathBuf>) -> Self {
        Self {
            changed: false,
            profile_name,
            profile_path,
        }
    }

    const fn changed(profile_name: Option<String>, profile_path: Option<PathBuf>) -> Self {
        Self {
            changed: true,
            profile_name,
            profile_path,
        }
    }
}

/// Drives the registry and browser capabilities towards a [`DesiredState`].
pub struct Reconciler<'a> {
    registry: &'a mut ProfileRegistry,
    browser: &'a dyn Browser,
    fs_ops: &'a dyn FileSystemOps,
    first_run_timeout: Duration,
    dry_run: bool,
}

impl std::fmt::Debug for Reconciler<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("registry", &self.registry.ini_path())
            .field("browser", &"<dyn Browser>")
            .field("fs_ops", &"<dyn FileSystemOps>")
            .field("first_run_timeout", &self.first_run_timeout)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl<'a> Reconciler<'a> {
    /// Create a reconciler with the default first-run timeout.
    #[must_use]
    pub fn new(
        registry: &'a mut ProfileRegistry,
        browser: &'a dyn Browser,
        fs_ops: &'a dyn FileSystemOps,
    ) -> Self {
        Self {
            registry,
            browser,
            fs_ops,
            first_run_timeout: DEFAULT_FIRST_RUN_TIMEOUT,
            dry_run: false,
        }
    }

    /// Override the first-run initialization timeout.
    #[must_use]
    pub const fn with_first_run_timeout(mut self, timeout: Duration) -> Self {
        self.first_run_timeout = timeout;
        self
    }

    /// Report what would change without invoking capabilities or writing.
    #[must_use]
    pub const fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The registry as of the last refresh.
    #[must_use]
    pub fn registry(&self) -> &ProfileRegistry {
        &*self.registry
    }

    /// Bring the profile `name` (or the default profile) to `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be read or written, a
    /// capability fails, or a profile directory cannot be removed.
    pub fn reconcile(&mut self, state: DesiredState, name: Option<&str>) -> Result<Outcome> {
        tracing::debug!(
            "{} profile(s) in {}",
            self.registry.profiles().count(),
            self.registry.ini_path().display()
        );
        match (state, name) {
            (DesiredState::Present, None) => self.ensure_default(),
            (DesiredState::Present, Some(name)) => self.ensure_present(name),
            (DesiredState::Absent, Some(name)) => self.ensure_absent(name),
            (DesiredState::Absent, None) => {
                tracing::info!("no profile name given; nothing to remove");
                Ok(Outcome::unchanged(None, None))
            }
        }
    }

    fn ensure_default(&mut self) -> Result<Outcome> {
        if let Some(name) = self.registry.default_profile_name().map(str::to_string) {
            let path = self.registry.resolve_path(&name)?;
            tracing::info!("default profile '{name}' already present");
            return Ok(Outcome::unchanged(Some(name), path));
        }

        if self.dry_run {
            tracing::info!(target: DRY_RUN, "would run first-run initialization");
            return Ok(Outcome::changed(None, None));
        }

        tracing::info!(target: STAGE, "Initializing browser");
        match self.browser.first_run(self.first_run_timeout)? {
            FirstRun::Completed => tracing::debug!("first-run initialization completed"),
            FirstRun::TimedOut { after } => tracing::warn!(
                "first-run initialization timed out after {}s; continuing with current registry",
                after.as_secs_f32()
            ),
        }
        self.registry.refresh()?;

        let Some(name) = self.registry.default_profile_name().map(str::to_string) else {
            tracing::warn!(
                "no default profile in {} after initialization",
                self.registry.ini_path().display()
            );
            return Ok(Outcome::changed(None, None));
        };
        let path = self.registry.resolve_path(&name)?;
        tracing::info!("default profile: {name}");
        Ok(Outcome::changed(Some(name), path))
    }

    fn ensure_present(&mut self, name: &str) -> Result<Outcome> {
        if self.registry.find_profile(name).is_some() {
            let path = self.registry.resolve_path(name)?;
            tracing::info!("profile '{name}' already present");
            return Ok(Outcome::unchanged(Some(name.to_string()), path));
        }

        if self.dry_run {
            tracing::info!(target: DRY_RUN, "would create profile '{name}'");
            return Ok(Outcome::changed(Some(name.to_string()), None));
        }

        tracing::info!(target: STAGE, "Creating profile '{name}'");
        self.browser.create_profile(name)?;
        self.registry.refresh()?;

        let path = self.registry.resolve_path(name)?;
        if path.is_none() {
            tracing::warn!(
                "profile '{name}' was created but is not listed in {}",
                self.registry.ini_path().display()
            );
        }
        Ok(Outcome::changed(Some(name.to_string()), path))
    }

    fn ensure_absent(&mut self, name: &str) -> Result<Outcome> {
        let Some(path) = self.registry.resolve_path(name)? else {
            tracing::info!("profile '{name}' already absent");
            return Ok(Outcome::unchanged(Some(name.to_string()), None));
        };

        self.check_removable(name, &path)?;

        if self.dry_run {
            tracing::info!(
                target: DRY_RUN,
                "would remove profile '{name}' at {}",
                path.display()
            );
            return Ok(Outcome::changed(Some(name.to_string()), Some(path)));
        }

        tracing::info!(target: STAGE, "Removing profile '{name}'");
        // Directory first: the path is unresolvable once the section is gone.
        match self.fs_ops.remove_dir_all(&path) {
            Ok(()) => tracing::debug!("removed {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("{} already removed", path.display());
            }
            Err(e) => return Err(ProfileError::io(path, e)),
        }
        self.registry.delete_profile(name)?;
        Ok(Outcome::changed(Some(name.to_string()), Some(path)))
    }

    /// Refuse directories whose removal would take the profiles root with them.
    ///
    /// Relative profiles must resolve strictly inside the root.
    fn check_removable(&self, name: &str, path: &Path) -> Result<()> {
        let root = normalize(self.registry.root());
        let target = normalize(path);
        let relative = self
            .registry
            .find_profile(name)
            .is_some_and(|p| p.is_relative());

        let reason = if root.starts_with(&target) {
            Some("it is the profiles root or one of its parents")
        } else if relative && !target.starts_with(&root) {
            Some("a relative profile path must stay inside the profiles root")
        } else {
            None
        };
        reason.map_or(Ok(()), |reason| {
            Err(ProfileError::UnsafeProfilePath {
                name: name.to_string(),
                path: path.to_path_buf(),
                reason,
            })
        })
    }
}

/// Lexically resolve `.` and `..` components without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_some() {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other),
        }
    }
    out
}
