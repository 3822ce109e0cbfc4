// Shared helpers for integration tests.
//
// Provides a temporary profiles root and a fake browser that edits
// `profiles.ini` the way Firefox does, so reconciliation can be exercised
// end to end without a real browser.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::time::Duration;

use firefox_profiles::browser::{Browser, FirstRun};
use firefox_profiles::config::Settings;
use firefox_profiles::error::Result;
use firefox_profiles::lifecycle::DesiredState;
use firefox_profiles::registry::{ProfileRegistry, REGISTRY_FILE};

/// Registry written by a first-run initialization.
pub const INITIALIZED: &str = "\
[InstallF0E1D2C3]
Default=r4nd.default-release
Locked=1

[Profile1]
Name=default
IsRelative=1
Path=0ld.default

[Profile0]
Name=default-release
IsRelative=1
Path=r4nd.default-release
Default=1

[General]
StartWithLastProfile=1
Version=2

";

/// Directory of the default profile in [`INITIALIZED`].
pub const DEFAULT_DIR: &str = "r4nd.default-release";

/// A registry with no `Install` section.
pub const UNINITIALIZED: &str = "\
[General]
StartWithLastProfile=1
Version=2

";

/// An isolated profiles root backed by a [`tempfile::TempDir`].
pub struct ProfilesRoot {
    dir: tempfile::TempDir,
}

impl ProfilesRoot {
    /// An empty root without `profiles.ini`.
    pub fn empty() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    /// A root whose `profiles.ini` contains `text`.
    pub fn with_registry(text: &str) -> Self {
        let root = Self::empty();
        root.write_registry(text);
        root
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn ini_path(&self) -> PathBuf {
        self.dir.path().join(REGISTRY_FILE)
    }

    pub fn write_registry(&self, text: &str) {
        std::fs::write(self.ini_path(), text).expect("write profiles.ini");
    }

    /// Current registry text, empty if the file does not exist.
    pub fn registry_text(&self) -> String {
        std::fs::read_to_string(self.ini_path()).unwrap_or_default()
    }

    /// Create a profile directory with a marker file inside.
    pub fn create_profile_dir(&self, relative: &str) -> PathBuf {
        let dir = self.dir.path().join(relative);
        std::fs::create_dir_all(&dir).expect("create profile dir");
        std::fs::write(dir.join("prefs.js"), "// prefs").expect("write prefs.js");
        dir
    }

    pub fn open(&self) -> ProfileRegistry {
        ProfileRegistry::open(self.path()).expect("open registry")
    }

    pub fn settings(&self, state: DesiredState, name: Option<&str>) -> Settings {
        Settings {
            root: self.path().to_path_buf(),
            state,
            name: name.map(str::to_string),
            browser: "firefox".to_string(),
            first_run_timeout: Duration::from_secs(10),
            dry_run: false,
        }
    }

    pub fn browser(&self) -> FakeBrowser {
        FakeBrowser::new(self.path())
    }
}

/// [`Browser`] double that mutates the registry on disk like Firefox.
///
/// First run writes [`INITIALIZED`]; profile creation appends a
/// `ProfileN` section pointing at `s4lt.<name>`.
pub struct FakeBrowser {
    root: PathBuf,
    first_runs: Cell<usize>,
    creations: Cell<usize>,
    hangs: bool,
}

impl FakeBrowser {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            first_runs: Cell::new(0),
            creations: Cell::new(0),
            hangs: false,
        }
    }

    /// Report every first run as timed out (after initializing the registry).
    pub fn hanging(mut self) -> Self {
        self.hangs = true;
        self
    }

    pub fn first_runs(&self) -> usize {
        self.first_runs.get()
    }

    pub fn creations(&self) -> usize {
        self.creations.get()
    }

    /// Directory a created profile called `name` ends up in.
    pub fn created_dir(name: &str) -> String {
        format!("s4lt.{name}")
    }
}

impl Browser for FakeBrowser {
    fn first_run(&self, timeout: Duration) -> Result<FirstRun> {
        self.first_runs.set(self.first_runs.get() + 1);
        std::fs::create_dir_all(self.root.join(DEFAULT_DIR)).expect("create default dir");
        std::fs::write(self.root.join(REGISTRY_FILE), INITIALIZED).expect("write profiles.ini");
        if self.hangs {
            Ok(FirstRun::TimedOut { after: timeout })
        } else {
            Ok(FirstRun::Completed)
        }
    }

    fn create_profile(&self, name: &str) -> Result<()> {
        self.creations.set(self.creations.get() + 1);
        let dir = Self::created_dir(name);
        std::fs::create_dir_all(self.root.join(&dir)).expect("create profile dir");
        ProfileRegistry::open(&self.root)?.add_profile(name, &dir, true)?;
        Ok(())
    }
}
