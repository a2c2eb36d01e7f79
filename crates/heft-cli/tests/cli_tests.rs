//! Smoke tests for the `heft` binary. None of these reach the network:
//! every failing case is rejected before a sandbox is created.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn heft(dir: &TempDir) -> Command {
    let mut cmd = Command::from(assert_cmd::cargo::cargo_bin_cmd!("heft"));
    cmd.current_dir(dir.path())
        .env_remove("HEFT_LOG")
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn help_lists_every_command() {
    let dir = TempDir::new().unwrap();
    heft(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("exports"))
        .stdout(predicate::str::contains("export-sizes"));
}

#[test]
fn version_is_printed() {
    let dir = TempDir::new().unwrap();
    heft(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("heft "));
}

#[test]
fn stats_help_documents_measurement_options() {
    let dir = TempDir::new().unwrap();
    heft(&dir)
        .args(["stats", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--client"))
        .stdout(predicate::str::contains("--import"))
        .stdout(predicate::str::contains("--json"));
}

#[test]
fn missing_package_argument_fails() {
    let dir = TempDir::new().unwrap();
    heft(&dir).arg("stats").assert().failure();
}

#[test]
fn unknown_client_is_rejected() {
    let dir = TempDir::new().unwrap();
    heft(&dir)
        .args(["stats", "react", "--client", "bun"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bun"));
}

#[test]
fn missing_config_file_is_reported() {
    let dir = TempDir::new().unwrap();
    heft(&dir)
        .args(["stats", "react", "--config", "nope.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn unknown_config_keys_are_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("heft.config.json"), r#"{"minifyer": "fast"}"#).unwrap();

    heft(&dir)
        .args(["exports", "react"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("minifyer"));
}

#[test]
fn invalid_config_values_are_reported() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("heft.config.json"), r#"{"installTimeout": 0}"#).unwrap();

    heft(&dir)
        .args(["stats", "react"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("installTimeout"));
}
