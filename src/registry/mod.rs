//! The `profiles.ini` registry: document model and profile-level queries.
//!
//! - **[`document`]**: parse, serialize, load, and save the section-based text format
//! - **[`profiles`]**: locate profiles, resolve the default profile and paths, add/remove profiles
pub mod document;
pub mod profiles;

pub use document::{Document, ParseError, Section, SectionKind};
pub use profiles::{Profile, ProfileRegistry, REGISTRY_FILE, expand_tilde};
