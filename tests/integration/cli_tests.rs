//! Integration tests for the CLI binary.
//!
//! Drives the `tk` binary end to end: login, then store commands carrying
//! the issued token.
//!
//! This test is registered as a [[test]] in the todokeep-cli crate
//! so that CARGO_BIN_EXE_tk is available.

use std::path::Path;
use std::process::{Command, Output};

const SECRET: &str = "0123456789abcdef0123456789abcdef";

/// Get a Command pointing to the `tk` binary, isolated in `dir`.
fn tk_binary(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tk"));
    cmd.current_dir(dir)
        .env_remove("TODO_TOKEN")
        .env("TODO_JWT_SECRET", SECRET)
        .env("TODO_USER", "alice")
        .env("TODO_PASSWORD", "pw-alice")
        .env("TODO_DATA_FILE", dir.join("data.json"));
    cmd
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

fn login(dir: &Path) -> String {
    let output = tk_binary(dir)
        .args(["login", "--username", "alice", "--password", "pw-alice", "--json"])
        .output()
        .expect("failed to execute tk login");
    stdout_json(&output)["token"]
        .as_str()
        .expect("token field")
        .to_string()
}

#[test]
fn cli_responds_to_help() {
    let dir = tempfile::tempdir().unwrap();
    let output = tk_binary(dir.path())
        .arg("--help")
        .output()
        .expect("failed to execute tk --help");

    assert!(
        output.status.success(),
        "tk --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("tk") || stdout.contains("todokeep") || stdout.contains("Usage"),
        "tk --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let dir = tempfile::tempdir().unwrap();
    let output = tk_binary(dir.path())
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute tk");

    assert!(
        !output.status.success(),
        "tk with unknown flag should exit with error"
    );
}

#[test]
fn cli_login_add_list_delete() {
    let dir = tempfile::tempdir().unwrap();
    let token = login(dir.path());

    let added = tk_binary(dir.path())
        .args(["add", "Buy milk", "--json", "--token", &token])
        .output()
        .unwrap();
    let added = stdout_json(&added);
    assert_eq!(added["todo"]["title"], "Buy milk");
    assert_eq!(added["todo"]["completed"], false);
    let id = added["todo"]["id"].as_str().unwrap().to_string();

    let updated = tk_binary(dir.path())
        .args(["update", &id, "--completed", "true", "--json"])
        .env("TODO_TOKEN", &token)
        .output()
        .unwrap();
    assert_eq!(stdout_json(&updated)["todo"]["completed"], true);

    let listed = tk_binary(dir.path())
        .args(["list", "--json", "--token", &token])
        .output()
        .unwrap();
    let listed = stdout_json(&listed);
    assert_eq!(listed["todos"].as_array().unwrap().len(), 1);
    assert_eq!(listed["todos"][0]["id"], id.as_str());

    let deleted = tk_binary(dir.path())
        .args(["delete", &id, "--json", "--token", &token])
        .output()
        .unwrap();
    assert_eq!(stdout_json(&deleted)["deleted"], true);

    let again = tk_binary(dir.path())
        .args(["delete", &id, "--token", &token])
        .output()
        .unwrap();
    assert!(!again.status.success());
    assert!(String::from_utf8_lossy(&again.stderr).contains("not_found"));
}

#[test]
fn cli_rejects_wrong_password() {
    let dir = tempfile::tempdir().unwrap();
    let output = tk_binary(dir.path())
        .args(["login", "--username", "alice", "--password", "nope"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid_credentials"));
}

#[test]
fn cli_verify_reports_error_code() {
    let dir = tempfile::tempdir().unwrap();
    let output = tk_binary(dir.path())
        .args(["verify", "not-a-token", "--json"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"], "invalid_format");
}

#[test]
fn cli_verify_accepts_issued_token() {
    let dir = tempfile::tempdir().unwrap();
    let token = login(dir.path());
    let output = tk_binary(dir.path())
        .args(["verify", &token, "--json"])
        .output()
        .unwrap();
    let body = stdout_json(&output);
    assert_eq!(body["ok"], true);
    assert_eq!(body["subject"], "alice");
}

#[test]
fn cli_store_commands_require_token() {
    let dir = tempfile::tempdir().unwrap();
    let output = tk_binary(dir.path()).arg("list").output().unwrap();
    assert!(!output.status.success());
    assert!(!dir.path().join("data.json").exists());
}

#[test]
fn cli_misconfigured_secret() {
    let dir = tempfile::tempdir().unwrap();
    let output = tk_binary(dir.path())
        .env("TODO_JWT_SECRET", "short")
        .args(["login", "--username", "alice", "--password", "pw-alice"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("server_misconfigured"));
}

#[test]
fn cli_reports_malformed_dotenv() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join(".env"), "this line is not an assignment\n").unwrap();
    let output = tk_binary(dir.path())
        .args(["verify", "not-a-token"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains(".env"));
}
