//! Binary-level tests for the CLI surface

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn apptask() -> Command {
    Command::cargo_bin("apptask").unwrap()
}

#[test]
fn test_help_lists_every_public_task() {
    apptask()
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("version")
                .and(predicate::str::contains("update"))
                .and(predicate::str::contains("setup-admin-user"))
                .and(predicate::str::contains("run-tests"))
                .and(predicate::str::contains("clear-assets"))
                .and(predicate::str::contains("virtual-host")),
        );
}

#[test]
fn test_unknown_subcommand_exits_nonzero() {
    apptask().arg("no-such-task").assert().failure();
}

#[test]
fn test_unreadable_settings_file_exits_nonzero() {
    apptask()
        .args(["--file", "/no/such/apptask.yml", "version"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_completions_subcommand_prints_script() {
    apptask()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("apptask"));
}

#[test]
fn test_clear_assets_end_to_end() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("apptask.yml"), "name: demo\n").unwrap();
    for area in ["frontend", "backend"] {
        let assets = temp.path().join(area).join("web").join("assets");
        fs::create_dir_all(assets.join("f00dcafe")).unwrap();
        fs::create_dir_all(assets.join("not-a-hash")).unwrap();
    }

    apptask()
        .args([
            "--file",
            temp.path().join("apptask.yml").to_str().unwrap(),
            "clear-assets",
        ])
        .assert()
        .success();

    for area in ["frontend", "backend"] {
        let assets = temp.path().join(area).join("web").join("assets");
        assert!(!assets.join("f00dcafe").exists());
        assert!(assets.join("not-a-hash").exists());
    }
}

#[test]
fn test_clear_assets_missing_directories_exit_code_is_one() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("apptask.yml"), "name: demo\n").unwrap();

    apptask()
        .args([
            "--file",
            temp.path().join("apptask.yml").to_str().unwrap(),
            "-s",
            "clear-assets",
        ])
        .assert()
        .code(1);
}

#[test]
fn test_version_task_runs_git_describe_in_project_dir() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("apptask.yml"), "name: demo\n").unwrap();

    // No git history in the temp dir: the describe step fails, the task
    // reports failure, the process exits 1
    apptask()
        .args([
            "--file",
            temp.path().join("apptask.yml").to_str().unwrap(),
            "-s",
            "version",
        ])
        .assert()
        .code(1);
}
