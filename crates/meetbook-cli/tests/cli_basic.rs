//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with HOME pointed at a scratch directory
//! and verify outputs.

use std::path::Path;
use std::process::Command;

const GRAPH_VARS: &[&str] = &[
    "AZURE_TENANT_ID",
    "AZURE_CLIENT_ID",
    "AZURE_CLIENT_SECRET",
    "ORGANIZER_UPN",
    "RUST_LOG",
    "MEETBOOK_ENV",
];

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_meetbook"));
    cmd.args(args).env("HOME", home);
    for var in GRAPH_VARS {
        cmd.env_remove(var);
    }
    let output = cmd.output().expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_days_json() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(
        home.path(),
        &["days", "--from", "2025-10-17", "--count", "3", "--json"],
    );
    assert_eq!(code, 0);
    let days: Vec<String> = serde_json::from_str(&stdout).unwrap();
    assert_eq!(days, vec!["2025-10-20", "2025-10-21", "2025-10-22"]);
}

#[test]
fn test_days_text() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["days", "--from", "2025-10-17", "-c", "1"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "2025-10-20 Mon");
}

#[test]
fn test_days_count_out_of_range() {
    let home = tempfile::tempdir().unwrap();
    let (stdout, _, code) = run_cli(home.path(), &["days", "--count", "100000000000"]);
    assert_eq!(code, 2);
    assert!(stdout.is_empty());

    let (_, _, code) = run_cli(home.path(), &["days", "--count", "0"]);
    assert_eq!(code, 2);
}

#[test]
fn test_config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    let (_, _, code) = run_cli(home.path(), &["config", "set", "working_hours.start_hour", "8"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "working_hours.start_hour"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "8");

    let (stdout, _, _) = run_cli(home.path(), &["config", "path"]);
    assert!(stdout.trim().ends_with("config.toml"));
    assert!(home.path().join(".config/meetbook/config.toml").exists());
}

#[test]
fn test_config_rejects_invalid_value() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "set", "working_hours.end_hour", "30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "{stderr}");
}

#[test]
fn test_config_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["config", "get", "nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_slots_without_credentials_fails() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["slots", "2025-10-20"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("not configured"), "{stderr}");
}
