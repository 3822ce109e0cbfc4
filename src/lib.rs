//! Firefox profile registry management.
//!
//! Reads and writes the browser's `profiles.ini`, resolves profile names to
//! directories, and drives a profile towards a desired state (`present` or
//! `absent`) idempotently, using the browser itself to initialize the
//! registry and create profiles.
//!
//! The public API is organised into four layers:
//!
//! - **[`registry`]**: parse and serialize `profiles.ini`, query and edit profiles
//! - **[`browser`]** and **[`operations`]**: external capabilities behind traits
//! - **[`lifecycle`]**: the idempotent reconciler
//! - **[`commands`]**: top-level orchestration used by the binary
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod browser;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod lifecycle;
pub mod logging;
pub mod operations;
pub mod registry;
