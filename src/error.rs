//! Domain-specific error types for profile management.
//!
//! Internal modules return [`ProfileError`] while the binary boundary
//! converts it to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error taxonomy
//!
//! ```text
//! ProfileError
//! ├── Parse            : malformed profiles.ini text
//! ├── Io               : registry read/write, directory removal
//! ├── MissingKey       : a profile section without a required key
//! ├── DuplicateSection : inserting a section name that already exists
//! ├── UnsafeProfilePath : a profile directory that would take the profiles root with it
//! ├── HomeDirUnavailable / InvalidName : bad run configuration
//! └── BrowserNotFound / Launch / CapabilityFailed : external browser capabilities
//! ```
//!
//! A timed-out first-run initialization is not an error; see
//! [`FirstRun::TimedOut`](crate::browser::FirstRun::TimedOut).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::registry::ParseError;

/// Result alias for profile operations.
pub type Result<T, E = ProfileError> = std::result::Result<T, E>;

/// Top-level error type for registry, capability, and configuration failures.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The registry file contains a syntax error.
    #[error("invalid registry {}", path.display())]
    Parse {
        /// Registry file being parsed.
        path: PathBuf,
        /// Location and description of the syntax error.
        source: ParseError,
    },

    /// An I/O operation failed.
    #[error("I/O error on {}", path.display())]
    Io {
        /// File or directory the operation targeted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// A profile section lacks a key required to answer the query.
    #[error("section [{section}] is missing required key '{key}'")]
    MissingKey {
        /// Name of the offending section.
        section: String,
        /// The absent key.
        key: &'static str,
    },

    /// A section with this name already exists in the document.
    #[error("section [{0}] already exists")]
    DuplicateSection(String),

    /// Removing the profile's directory would also remove the profiles root.
    #[error("refusing to remove {} for profile '{name}': {reason}", path.display())]
    UnsafeProfilePath {
        /// Profile being removed.
        name: String,
        /// Directory the profile resolves to.
        path: PathBuf,
        /// How the directory relates to the profiles root.
        reason: &'static str,
    },

    /// The invoking user's home directory could not be determined.
    #[error("cannot expand '~': home directory is unknown")]
    HomeDirUnavailable,

    /// The requested profile name cannot be used.
    #[error("invalid profile name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The browser executable could not be located.
    #[error("browser executable '{program}' not found on PATH")]
    BrowserNotFound {
        /// Program name or path that was looked up.
        program: String,
    },

    /// The browser process could not be started.
    #[error("failed to launch '{program}'")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// Underlying spawn error.
        source: io::Error,
    },

    /// An external capability exited unsuccessfully.
    #[error("{capability} failed (exit {}): {stderr}", exit_code.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    CapabilityFailed {
        /// Human-readable capability name (e.g. `"profile creation"`).
        capability: &'static str,
        /// Process exit code, `None` if terminated by a signal.
        exit_code: Option<i32>,
        /// Captured standard error, verbatim.
        stderr: String,
    },
}

impl ProfileError {
    /// Build an [`Io`](Self::Io) error for `path`.
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
