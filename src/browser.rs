//! External browser capabilities: first-run initialization and profile creation.
//!
//! Both capabilities mutate `profiles.ini` out of process.  Callers refresh
//! the registry after every invocation.
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ProfileError, Result};
use crate::exec::Executor;

const FIRST_RUN: &str = "first-run initialization";
const CREATE_PROFILE: &str = "profile creation";

/// Outcome of a first-run initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRun {
    /// The browser exited successfully.
    Completed,
    /// The browser was still running when the timeout expired and was killed.
    ///
    /// Not a failure: initialization may have populated the registry anyway.
    TimedOut {
        /// The timeout that expired.
        after: Duration,
    },
}

/// Capabilities provided by the browser binary.
#[cfg_attr(test, mockall::automock)]
pub trait Browser {
    /// Start the browser once so it creates its registry and default profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser cannot be launched or exits non-zero
    /// before `timeout` expires.
    fn first_run(&self, timeout: Duration) -> Result<FirstRun>;

    /// Ask the browser to create a profile called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the browser cannot be launched or exits non-zero.
    fn create_profile(&self, name: &str) -> Result<()>;
}

/// [`Browser`] backed by a headless Firefox process.
pub struct Firefox<'a> {
    program: String,
    executor: &'a dyn Executor,
}

impl fmt::Debug for Firefox<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Firefox")
            .field("program", &self.program)
            .field("executor", &"<dyn Executor>")
            .finish()
    }
}

impl<'a> Firefox<'a> {
    /// Create a browser handle for `program` (a name on `PATH` or a path).
    #[must_use]
    pub fn new(program: impl Into<String>, executor: &'a dyn Executor) -> Self {
        Self {
            program: program.into(),
            executor,
        }
    }

    /// Locate the executable.  Done per invocation so runs that never need
    /// the browser work without it installed.
    fn locate(&self) -> Result<PathBuf> {
        which::which(&self.program).map_err(|_| ProfileError::BrowserNotFound {
            program: self.program.clone(),
        })
    }

    fn launch_error(&self, source: std::io::Error) -> ProfileError {
        ProfileError::Launch {
            program: self.program.clone(),
            source,
        }
    }
}

impl Browser for Firefox<'_> {
    fn first_run(&self, timeout: Duration) -> Result<FirstRun> {
        let program = self.locate()?;
        let args = to_args(&["--headless", "--no-remote", "--first-startup"]);
        tracing::debug!("running {} {}", program.display(), args.join(" "));

        match self
            .executor
            .run_with_timeout(&program, &args, timeout)
            .map_err(|e| self.launch_error(e))?
        {
            None => {
                tracing::warn!(
                    "{FIRST_RUN} still running after {}s; process killed",
                    timeout.as_secs_f32()
                );
                Ok(FirstRun::TimedOut { after: timeout })
            }
            Some(result) if result.success => Ok(FirstRun::Completed),
            Some(result) => Err(ProfileError::CapabilityFailed {
                capability: FIRST_RUN,
                exit_code: result.code,
                stderr: result.stderr,
            }),
        }
    }

    fn create_profile(&self, name: &str) -> Result<()> {
        // Firefox reads `-CreateProfile "name dir"` as a name plus a directory.
        if name.contains(' ') {
            return Err(ProfileError::InvalidName {
                name: name.to_string(),
                reason: "must not contain spaces when created by the browser",
            });
        }
        let program = self.locate()?;
        let args = to_args(&["--headless", "-no-remote", "-CreateProfile", name]);
        tracing::debug!("running {} {}", program.display(), args.join(" "));

        let result = self
            .executor
            .run_unchecked(&program, &args)
            .map_err(|e| self.launch_error(e))?;
        if !result.success {
            return Err(ProfileError::CapabilityFailed {
                capability: CREATE_PROFILE,
                exit_code: result.code,
                stderr: result.stderr,
            });
        }
        if !result.stderr.trim().is_empty() {
            tracing::debug!("{CREATE_PROFILE}: {}", result.stderr.trim());
        }
        Ok(())
    }
}

fn to_args(args: &[&str]) -> Vec<String> {
    args.iter().map(ToString::to_string).collect()
}
