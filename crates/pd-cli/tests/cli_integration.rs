//! CLI integration tests
//!
//! Tests the plugdesk CLI using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;

fn plugdesk() -> Command {
    let mut cmd = Command::cargo_bin("plugdesk")
        .expect("Failed to locate plugdesk binary - ensure it's built before running tests");
    cmd.env_remove("PLUGDESK_TOKEN")
        .env_remove("PLUGDESK_PASSWORD")
        .env_remove("PLUGDESK_SERVER")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_cli_help() {
    plugdesk()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("plugdesk"))
        .stdout(predicate::str::contains("realtime telemetry"));
}

#[test]
fn test_cli_version() {
    plugdesk()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("plugdesk"));
}

#[test]
fn test_cli_serve_help() {
    plugdesk()
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--bind"))
        .stdout(predicate::str::contains("--plugins"));
}

#[test]
fn test_hash_password_argument() {
    plugdesk()
        .args(["hash-password", "hunter2"])
        .assert()
        .success()
        .stdout("f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7\n");
}

#[test]
fn test_hash_password_stdin() {
    plugdesk()
        .arg("hash-password")
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("f52fbd32b2b3b86f"));
}

#[test]
fn test_status_requires_token() {
    plugdesk()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--token"));
}

#[test]
fn test_status_unreachable_server() {
    plugdesk()
        .args(["status", "--token", "abc", "--server", "http://127.0.0.1:1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to reach"));
}

#[test]
fn test_serve_missing_config_fails() {
    let dir = tempfile::TempDir::new().unwrap();
    plugdesk()
        .args(["serve", "--config"])
        .arg(dir.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load config"));
}

#[test]
fn test_plugins_listing() {
    let root = tempfile::TempDir::new().unwrap();
    let api = root.path().join("system-monitor").join("api");
    std::fs::create_dir_all(&api).unwrap();
    std::fs::write(
        api.join("socket.toml"),
        "handler = \"system\"\nnamespace = \"/system\"\n",
    )
    .unwrap();
    std::fs::create_dir_all(root.path().join("notes")).unwrap();

    plugdesk()
        .args(["plugins", "--root"])
        .arg(root.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("system-monitor"))
        .stdout(predicate::str::contains("/system"))
        .stdout(predicate::str::contains("notes"));
}
