// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end tests for the docvault binary.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    // Settle interval disabled so checkpoint tests stay fast.
    std::fs::write(
        dir.path().join("docvault.toml"),
        "version = 1\n\n[checkpoint]\nsettle_secs = 0.0\n",
    )
    .unwrap();
    dir
}

fn docvault(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("docvault").unwrap();
    cmd.current_dir(dir.path());
    cmd
}

#[test]
fn bare_invocation_prints_help() {
    let dir = project();
    docvault(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("docvault"));
}

#[test]
fn cache_check_reports_drift_then_fix_repairs_it() {
    let dir = project();
    std::fs::write(dir.path().join("notes.md"), "hello").unwrap();

    docvault(&dir)
        .args(["cache", "check"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("missing in cache"));

    docvault(&dir)
        .args(["cache", "check", "--fix"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache state is in sync"));

    docvault(&dir)
        .args(["cache", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cache state is in sync"));

    assert!(dir.path().join("cache_state.json").is_file());
}

#[test]
fn cache_stats_prints_a_summary() {
    let dir = project();
    std::fs::write(dir.path().join("notes.md"), "hello").unwrap();

    docvault(&dir)
        .args(["cache", "check", "--fix"])
        .assert()
        .success();

    docvault(&dir)
        .args(["cache", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("tracked on disk"))
        .stdout(predicate::str::contains("hit rate"));
}

#[test]
fn checkpoint_prepare_writes_artifacts_and_restore_succeeds() {
    let dir = project();

    docvault(&dir)
        .args(["checkpoint", "prepare"])
        .assert()
        .success()
        .stdout(predicate::str::contains("checkpoint ready"));

    let backup = dir.path().join("checkpoint_backup");
    assert!(backup.join("cache_backup.bin").is_file());
    assert!(backup.join("state_backup.json").is_file());
    assert!(backup.join("checkpoint_metadata.json").is_file());
    assert!(backup.join("cleanup_report.json").is_file());

    docvault(&dir)
        .args(["checkpoint", "restore"])
        .assert()
        .success()
        .stdout(predicate::str::contains("checkpoint_backup"));

    assert!(backup.join("recovery_report.json").is_file());
}

#[test]
fn checkpoint_restore_without_state_fails() {
    let dir = project();

    docvault(&dir)
        .args(["checkpoint", "restore"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("checkpoint aborted"));
}

#[test]
fn checkpoint_backup_and_cleanup_run_standalone() {
    let dir = project();

    docvault(&dir)
        .args(["checkpoint", "backup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("backed up 0 documents"));

    docvault(&dir)
        .args(["checkpoint", "cleanup"])
        .assert()
        .success()
        .stdout(predicate::str::contains("cleanup handlers"));
}

#[test]
fn explicit_missing_config_is_an_error() {
    let dir = project();

    docvault(&dir)
        .args(["-C", "missing.toml", "cache", "stats"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("config"));
}
