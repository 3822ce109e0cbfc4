#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! End-to-end tests of the `firefox-profile` binary.
//!
//! Only paths that never launch the browser are exercised here.

mod common;

use std::process::{Command, Output};

use common::{INITIALIZED, ProfilesRoot};

fn firefox_profile(root: &ProfilesRoot, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_firefox-profile"))
        .arg("--path")
        .arg(root.path())
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run firefox-profile")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn present_existing_profile_prints_unchanged_record() {
    let root = ProfilesRoot::with_registry(INITIALIZED);

    let output = firefox_profile(&root, &["--name", "default-release"]);

    let json = stdout_json(&output);
    assert_eq!(json["changed"], false);
    assert_eq!(json["profile_name"], "default-release");
    assert_eq!(
        json["profile_path"],
        root.path().join("r4nd.default-release").to_str().unwrap()
    );
}

#[test]
fn default_profile_is_reported_without_browser() {
    let root = ProfilesRoot::with_registry(INITIALIZED);

    let output = firefox_profile(&root, &["--firefox", "no-such-browser-binary"]);

    let json = stdout_json(&output);
    assert_eq!(json["changed"], false);
    assert_eq!(json["profile_name"], "default-release");
}

#[test]
fn absent_removes_profile() {
    let root = ProfilesRoot::with_registry(INITIALIZED);
    let dir = root.create_profile_dir("0ld.default");

    let output = firefox_profile(&root, &["--name", "default", "--state", "absent"]);

    let json = stdout_json(&output);
    assert_eq!(json["changed"], true);
    assert!(!dir.exists());
    assert!(!root.registry_text().contains("Name=default\n"));
}

#[test]
fn absent_unknown_profile_prints_null_path() {
    let root = ProfilesRoot::empty();

    let output = firefox_profile(&root, &["--name", "work", "--state", "absent"]);

    let json = stdout_json(&output);
    assert_eq!(
        json,
        serde_json::json!({"changed": false, "profile_name": "work", "profile_path": null})
    );
    assert!(!root.ini_path().exists());
}

#[test]
fn logs_go_to_stderr_only() {
    let root = ProfilesRoot::with_registry(INITIALIZED);

    let output = firefox_profile(&root, &["--name", "default-release", "--verbose"]);

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("==> Loading profile registry"), "{stderr}");
    stdout_json(&output);
}

#[test]
fn missing_browser_fails_with_message() {
    let root = ProfilesRoot::with_registry(INITIALIZED);

    let output = firefox_profile(&root, &["--name", "work", "--firefox", "no-such-browser-binary"]);

    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("browser executable 'no-such-browser-binary' not found"),
        "{stderr}"
    );
}

#[test]
fn malformed_registry_fails_with_line_number() {
    let root = ProfilesRoot::with_registry("[Profile0]\nName\n");

    let output = firefox_profile(&root, &[]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("line 2"), "{stderr}");
}

#[test]
fn blank_name_is_rejected() {
    let root = ProfilesRoot::with_registry(INITIALIZED);

    let output = firefox_profile(&root, &["--name", " "]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid profile name"), "{stderr}");
    assert_eq!(root.registry_text(), INITIALIZED);
}
