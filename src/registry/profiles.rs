//! Profile lookup and mutation on top of the registry [`Document`].
//!
//! Every mutation follows the same cycle: mutate in memory, save, reload.
//! After any call returns, the in-memory document reflects what is on disk.
use std::path::{Path, PathBuf};

use super::document::{Document, Section, SectionKind};
use crate::error::{ProfileError, Result};

/// File name of the registry inside the profiles root.
pub const REGISTRY_FILE: &str = "profiles.ini";

/// Read-only view of a `Profile*` section.
#[derive(Debug, Clone, Copy)]
pub struct Profile<'a> {
    section: &'a Section,
}

impl<'a> Profile<'a> {
    /// Name of the backing section (e.g. `Profile0`).
    #[must_use]
    pub fn section_name(&self) -> &'a str {
        self.section.name()
    }

    /// Logical profile name (`Name`).
    #[must_use]
    pub fn name(&self) -> Option<&'a str> {
        self.section.get("Name")
    }

    /// Stored path (`Path`), relative or absolute.
    #[must_use]
    pub fn path(&self) -> Option<&'a str> {
        self.section.get("Path")
    }

    /// Whether `Path` is relative to the profiles root (`IsRelative=1`).
    #[must_use]
    pub fn is_relative(&self) -> bool {
        self.section
            .get("IsRelative")
            .is_some_and(|v| v.trim() == "1")
    }

    /// Resolve the on-disk directory of this profile against `root`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::MissingKey`] if the section has no `Path`.
    pub fn resolve(&self, root: &Path) -> Result<PathBuf> {
        let path = self.path().ok_or_else(|| ProfileError::MissingKey {
            section: self.section_name().to_string(),
            key: "Path",
        })?;
        if self.is_relative() {
            Ok(root.join(path))
        } else {
            Ok(PathBuf::from(path))
        }
    }
}

/// The profiles registry of one profiles root.
#[derive(Debug)]
pub struct ProfileRegistry {
    root: PathBuf,
    ini_path: PathBuf,
    document: Document,
}

impl ProfileRegistry {
    /// Open the registry under `root` (a leading `~` is expanded) and load it.
    ///
    /// A missing `profiles.ini` is not an error: the registry starts empty.
    ///
    /// # Errors
    ///
    /// Returns an error if `~` cannot be expanded or the file cannot be
    /// read or parsed.
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = expand_tilde(root.as_ref())?;
        let ini_path = root.join(REGISTRY_FILE);
        let document = Document::load(&ini_path)?;
        tracing::debug!(
            "loaded {} ({} sections)",
            ini_path.display(),
            document.len()
        );
        Ok(Self {
            root,
            ini_path,
            document,
        })
    }

    /// The profiles root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of `profiles.ini`.
    #[must_use]
    pub fn ini_path(&self) -> &Path {
        &self.ini_path
    }

    /// The in-memory document, as last loaded from disk.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// Discard in-memory state and reload from disk.
    ///
    /// Used after any external process may have rewritten the registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn refresh(&mut self) -> Result<()> {
        self.document = Document::load(&self.ini_path)?;
        tracing::debug!("reloaded {}", self.ini_path.display());
        Ok(())
    }

    /// All profiles in document order.
    pub fn profiles(&self) -> impl Iterator<Item = Profile<'_>> {
        self.document
            .sections_of(SectionKind::Profile)
            .map(|section| Profile { section })
    }

    /// First profile whose `Name` equals `name` exactly.
    #[must_use]
    pub fn find_profile(&self, name: &str) -> Option<Profile<'_>> {
        self.profiles().find(|p| p.name() == Some(name))
    }

    /// Name of the default profile.
    ///
    /// Each `Install*` section's `Default` holds a profile *path*; the first
    /// one that matches a profile's `Path` determines the default.  `None`
    /// means no profile has been initialized yet.
    #[must_use]
    pub fn default_profile_name(&self) -> Option<&str> {
        self.document
            .sections_of(SectionKind::Install)
            .filter_map(|install| install.get("Default"))
            .find_map(|default_path| {
                self.profiles()
                    .find(|p| p.path() == Some(default_path))
                    .and_then(|p| p.name())
            })
    }

    /// Filesystem directory of the named profile, `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::MissingKey`] if the profile has no `Path`.
    pub fn resolve_path(&self, name: &str) -> Result<Option<PathBuf>> {
        self.find_profile(name)
            .map(|p| p.resolve(&self.root))
            .transpose()
    }

    /// Append a new `ProfileN` section and persist it.
    ///
    /// The lowest unused index is chosen.  Returns the new section name.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be written or reloaded.
    pub fn add_profile(&mut self, name: &str, path: &str, is_relative: bool) -> Result<String> {
        // n sections leave at least one of Profile0..=Profile{n} free.
        let section_name = (0..=self.document.len())
            .map(|i| format!("Profile{i}"))
            .find(|candidate| self.document.section(candidate).is_none())
            .ok_or_else(|| {
                ProfileError::DuplicateSection(format!("Profile{}", self.document.len()))
            })?;

        let mut section = Section::new(section_name.clone());
        section.set("Name", name);
        section.set("IsRelative", if is_relative { "1" } else { "0" });
        section.set("Path", path);
        self.document.push_section(section)?;
        self.persist()?;
        tracing::debug!("added [{section_name}] for profile '{name}'");
        Ok(section_name)
    }

    /// Remove the named profile's section and persist.
    ///
    /// The profile directory is not touched; callers remove it first, while
    /// the path can still be resolved.  Returns `false` without writing
    /// anything if no such profile exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be written or reloaded.
    pub fn delete_profile(&mut self, name: &str) -> Result<bool> {
        let Some(section_name) = self
            .find_profile(name)
            .map(|p| p.section_name().to_string())
        else {
            return Ok(false);
        };
        self.document.remove_section(&section_name);
        self.persist()?;
        tracing::debug!("removed [{section_name}] for profile '{name}'");
        Ok(true)
    }

    /// Save the document and reload it so memory mirrors disk.
    fn persist(&mut self) -> Result<()> {
        let saved = self.document.save(&self.ini_path);
        // Resynchronize even if the write failed part-way.
        let reloaded = self.refresh();
        saved.and(reloaded)
    }
}

/// Expand a leading `~` to the invoking user's home directory.
///
/// `~user` forms are left untouched.
///
/// # Errors
///
/// Returns [`ProfileError::HomeDirUnavailable`] if the path starts with `~`
/// and the home directory is unknown.
pub fn expand_tilde(path: &Path) -> Result<PathBuf> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path.to_path_buf());
    };
    let home = dirs::home_dir().ok_or(ProfileError::HomeDirUnavailable)?;
    Ok(if rest.as_os_str().is_empty() {
        home
    } else {
        home.join(rest)
    })
}
