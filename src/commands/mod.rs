//! Top-level command orchestration.
pub mod ensure;
