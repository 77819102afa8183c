//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `directus-tools` binary and verify exit
//! codes, stdout content, and stderr content. No test here needs a running
//! Directus instance: the API host points at a closed loopback port when a
//! network call is expected to fail.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::net::TcpListener;
use tempfile::TempDir;

/// Helper: the binary with no Directus environment inherited.
fn directus_tools() -> Command {
    let mut cmd = cargo_bin_cmd!("directus-tools");
    cmd.env_remove("DIRECTUS_API_HOST")
        .env_remove("DIRECTUS_ADMIN_TOKEN")
        .env_remove("DIRECTUS_PROJECT")
        .env_remove("DIRECTUS_TIMEOUT_SECS")
        .env_remove("RUST_LOG");
    cmd
}

/// Helper: the binary configured against a loopback port nobody listens on.
fn unreachable_api() -> Command {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut cmd = directus_tools();
    cmd.env("DIRECTUS_API_HOST", format!("http://{}", addr))
        .env("DIRECTUS_ADMIN_TOKEN", "test-token")
        .env("DIRECTUS_TIMEOUT_SECS", "5");
    cmd
}

// ──────────────────────────────────────────────
// 1. Help and usage
// ──────────────────────────────────────────────

#[test]
fn help_lists_commands() {
    directus_tools()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("rename_field"))
        .stdout(predicate::str::contains("create_m2o"))
        .stdout(predicate::str::contains("copy_field_data"))
        .stdout(predicate::str::contains("DIRECTUS_API_HOST"));
}

#[test]
fn no_command_prints_usage_and_fails() {
    directus_tools()
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_command_fails() {
    directus_tools()
        .arg("explode_everything")
        .assert()
        .failure()
        .code(2);
}

#[test]
fn wrong_argument_count_fails_with_usage() {
    directus_tools()
        .args(["rename_field", "posts", "title"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("NEW_FIELD"));

    directus_tools()
        .args(["copy_field_data", "posts", "title"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("TO_FIELD"));

    directus_tools()
        .args(["drop_field", "posts", "title", "extra"])
        .assert()
        .failure()
        .code(2);
}

// ──────────────────────────────────────────────
// 2. Environment
// ──────────────────────────────────────────────

#[test]
fn missing_environment_reports_each_variable() {
    directus_tools()
        .arg("api_info")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains(
            "environment variable DIRECTUS_API_HOST must be set",
        ))
        .stderr(predicate::str::contains(
            "environment variable DIRECTUS_ADMIN_TOKEN must be set",
        ));
}

#[test]
fn missing_token_only_reports_token() {
    directus_tools()
        .env("DIRECTUS_API_HOST", "http://127.0.0.1:1")
        .arg("api_info")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("DIRECTUS_ADMIN_TOKEN must be set"))
        .stderr(predicate::str::contains("DIRECTUS_API_HOST must be set").not());
}

#[test]
fn invalid_timeout_is_rejected() {
    directus_tools()
        .env("DIRECTUS_API_HOST", "http://127.0.0.1:1")
        .env("DIRECTUS_ADMIN_TOKEN", "t")
        .env("DIRECTUS_TIMEOUT_SECS", "later")
        .arg("api_info")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("DIRECTUS_TIMEOUT_SECS"));
}

// ──────────────────────────────────────────────
// 3. Local validation before any network call
// ──────────────────────────────────────────────

#[test]
fn patch_with_missing_file_fails() {
    unreachable_api()
        .args(["patch", "no_such_schema.json"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("doesn't exist"));
}

#[test]
fn patch_schema_without_collection_fails() {
    let tmp = TempDir::new().unwrap();
    let schema = tmp.path().join("posts.json");
    fs::write(&schema, r#"{"fields": {"title": {"datatype": "VARCHAR"}}}"#).unwrap();

    unreachable_api()
        .arg("patch")
        .arg(&schema)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("'collection'"));
}

#[test]
fn create_collection_with_invalid_json_fails() {
    let tmp = TempDir::new().unwrap();
    let schema = tmp.path().join("broken.json");
    fs::write(&schema, "{ not json").unwrap();

    unreachable_api()
        .arg("create_collection")
        .arg(&schema)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid JSON"));
}

// ──────────────────────────────────────────────
// 4. Network failures
// ──────────────────────────────────────────────

#[test]
fn unreachable_api_fails_connectivity_check() {
    unreachable_api()
        .arg("api_info")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("cannot reach the API"));
}

#[test]
fn json_output_reports_error_object() {
    let output = unreachable_api()
        .args(["--output", "json", "drop_collection", "legacy"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    let error_line = stderr
        .lines()
        .find(|line| line.starts_with('{'))
        .expect("a JSON error line");
    let parsed: serde_json::Value = serde_json::from_str(error_line).unwrap();
    assert!(parsed["error"]
        .as_str()
        .unwrap()
        .contains("cannot reach the API"));
}

#[test]
fn quiet_failure_prints_nothing_on_stderr() {
    unreachable_api()
        .args(["--quiet", "get_data", "/collections"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::is_empty());
}
