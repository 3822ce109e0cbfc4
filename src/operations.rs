//! Filesystem operation abstractions for dependency injection.
//!
//! Provides the [`FileSystemOps`] trait so profile directory removal can be
//! replaced in unit tests.  Production code uses [`SystemFileSystemOps`].

use std::io;
use std::path::Path;

/// Abstraction over destructive filesystem operations.
#[cfg_attr(test, mockall::automock)]
pub trait FileSystemOps {
    /// Recursively remove the directory at `path` and everything inside it.
    ///
    /// # Errors
    ///
    /// Returns an error if removal fails, including [`io::ErrorKind::NotFound`]
    /// when `path` does not exist.
    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;
}

/// Production [`FileSystemOps`] implementation that delegates to [`std::fs`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFileSystemOps;

impl FileSystemOps for SystemFileSystemOps {
    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_dir_all(path)
    }
}
