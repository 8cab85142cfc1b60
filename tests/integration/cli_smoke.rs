//! Smoke tests for the packline binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn packline(data_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("packline").expect("binary builds");
    cmd.arg("--data-dir").arg(data_dir.path());
    cmd
}

#[test]
fn help_lists_the_workflow_commands() {
    Command::cargo_bin("packline")
        .expect("binary builds")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("submit"))
        .stdout(predicate::str::contains("sync"));
}

#[test]
fn whoami_without_a_session_fails_cleanly() {
    let dir = TempDir::new().expect("temp dir");
    packline(&dir)
        .arg("whoami")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));
}

#[test]
fn workflow_commands_require_a_session() {
    let dir = TempDir::new().expect("temp dir");
    packline(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));

    packline(&dir)
        .arg("queue")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not signed in"));
}

#[test]
fn login_against_an_unreachable_backend_reports_it() {
    let dir = TempDir::new().expect("temp dir");
    packline(&dir)
        .args(["--api-url", "http://127.0.0.1:1/api"])
        .args(["login", "dana.mills", "--password", "pw"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("backend unreachable"));
}

#[test]
fn data_dir_flag_creates_an_isolated_store() {
    let dir = TempDir::new().expect("temp dir");
    packline(&dir)
        .arg("whoami")
        .assert()
        .failure();
    assert!(dir.path().join("packline.db").exists());
    assert!(dir.path().join("config.toml").exists());
}
