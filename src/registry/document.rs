//! Ordered, section-based document model for `profiles.ini`.
//!
//! Only the subset of INI the browser writes is supported: `[name]`
//! headers and `key=value` entries.  Keys and section names keep their exact
//! case, and serialization emits no whitespace around `=`.
use std::fmt;
use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write as _};
use std::path::Path;

use crate::error::{ProfileError, Result};

/// Role of a section, derived once from its name prefix.
///
/// # Examples
///
/// ```
/// use firefox_profiles::registry::SectionKind;
///
/// assert_eq!(SectionKind::from_name("Install4F96D1932A9F858E"), SectionKind::Install);
/// assert_eq!(SectionKind::from_name("Profile0"), SectionKind::Profile);
/// assert_eq!(SectionKind::from_name("General"), SectionKind::Other);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// `Install*`: records the default profile of one installation.
    Install,
    /// `Profile*`: describes one profile.
    Profile,
    /// Anything else (`[General]`, `[BackgroundTasksProfiles]`, ...), kept verbatim.
    Other,
}

impl SectionKind {
    /// Classify a section by its name prefix.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        if name.starts_with("Install") {
            Self::Install
        } else if name.starts_with("Profile") {
            Self::Profile
        } else {
            Self::Other
        }
    }
}

/// A named section holding ordered, case-sensitive key/value entries.
///
/// # Examples
///
/// ```
/// use firefox_profiles::registry::{Section, SectionKind};
///
/// let mut section = Section::new("Profile0");
/// section.set("Name", "default");
/// section.set("IsRelative", "1");
/// assert_eq!(section.kind(), SectionKind::Profile);
/// assert_eq!(section.get("Name"), Some("default"));
/// assert_eq!(section.get("name"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    kind: SectionKind,
    entries: Vec<(String, String)>,
}

impl Section {
    /// Create an empty section.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            kind: SectionKind::from_name(&name),
            name,
            entries: Vec::new(),
        }
    }

    /// The section name as written between the brackets.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The section role.
    #[must_use]
    pub const fn kind(&self) -> SectionKind {
        self.kind
    }

    /// Look up a value by exact key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Set a value, replacing an existing entry in place or appending a new one.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Entries in document order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A syntax error in registry text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    /// Description of the problem.
    pub message: String,
}

impl ParseError {
    /// Create a parse error at `line`.
    #[must_use]
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// An ordered collection of uniquely named sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    /// Parse registry text.
    ///
    /// # Examples
    ///
    /// ```
    /// use firefox_profiles::registry::Document;
    ///
    /// let doc = Document::parse("[Profile0]\nName=default\nIsRelative=1\n").unwrap();
    /// assert_eq!(doc.section("Profile0").and_then(|s| s.get("Name")), Some("default"));
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] for unterminated or empty headers, entries
    /// outside a section, lines without `=`, empty keys, and duplicate
    /// sections or keys.
    pub fn parse(content: &str) -> Result<Self, ParseError> {
        let mut sections: Vec<Section> = Vec::new();

        for (idx, line) in content.lines().enumerate() {
            let line_num = idx + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
                continue;
            }

            if let Some(rest) = trimmed.strip_prefix('[') {
                let name = parse_header(rest).map_err(|m| ParseError::new(line_num, m))?;
                if sections.iter().any(|s| s.name == name) {
                    return Err(ParseError::new(
                        line_num,
                        format!("duplicate section [{name}]"),
                    ));
                }
                sections.push(Section::new(name));
                continue;
            }

            let Some(section) = sections.last_mut() else {
                return Err(ParseError::new(
                    line_num,
                    format!("entry outside of section: {trimmed}"),
                ));
            };
            let (key, value) = parse_entry(trimmed).map_err(|m| ParseError::new(line_num, m))?;
            if section.get(key).is_some() {
                return Err(ParseError::new(
                    line_num,
                    format!("duplicate key '{key}' in section [{}]", section.name),
                ));
            }
            section.entries.push((key.to_string(), value.to_string()));
        }

        Ok(Self { sections })
    }

    /// Load a registry file.  A missing file yields an empty document.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Io`] if the file exists but cannot be read and
    /// [`ProfileError::Parse`] if its contents are malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ProfileError::io(path, e)),
        };
        Self::parse(&content).map_err(|source| ProfileError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the document to `path`, replacing prior contents.
    ///
    /// The file handle is flushed and closed on every exit path.  A failure
    /// may leave a partially written file; callers reload afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::Io`] if the file cannot be created or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|e| ProfileError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.to_string().as_bytes())
            .and_then(|()| writer.flush())
            .map_err(|e| ProfileError::io(path, e))
    }

    /// Sections in document order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    /// Sections of one kind, in document order.
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }

    /// Look up a section by exact name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Append a section.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::DuplicateSection`] if the name is taken.
    pub fn push_section(&mut self, section: Section) -> Result<()> {
        if self.section(&section.name).is_some() {
            return Err(ProfileError::DuplicateSection(section.name));
        }
        self.sections.push(section);
        Ok(())
    }

    /// Remove a section by name, preserving the order of the rest.
    pub fn remove_section(&mut self, name: &str) -> Option<Section> {
        let idx = self.sections.iter().position(|s| s.name == name)?;
        Some(self.sections.remove(idx))
    }

    /// Number of sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// Whether the document has no sections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for section in &self.sections {
            writeln!(f, "[{}]", section.name)?;
            for (key, value) in &section.entries {
                writeln!(f, "{key}={value}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Parse the remainder of a header line after the opening `[`.
fn parse_header(rest: &str) -> Result<String, String> {
    let inner = rest
        .strip_suffix(']')
        .ok_or_else(|| format!("unterminated section header: [{rest}"))?;
    let name = inner.trim();
    if name.is_empty() {
        return Err("empty section name".to_string());
    }
    Ok(name.to_string())
}

/// Split a `key=value` line on the first `=`.
fn parse_entry(line: &str) -> Result<(&str, &str), String> {
    let (key, value) = line
        .split_once('=')
        .ok_or_else(|| format!("expected key=value: {line}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key: {line}"));
    }
    Ok((key, value.trim()))
}
