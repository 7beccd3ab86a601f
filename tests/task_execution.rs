//! Integration tests for task orchestration

mod common;

use apptask::config::Settings;
use apptask::error::TaskError;
use apptask::runner::{Action, CommandSpec, Step, StepGroup, Task};
use apptask::tasks::register_builtin_tasks;
use common::{orchestrator, quiet_ctx};
use std::collections::HashMap;
use std::env;
use std::fs;
use tempfile::TempDir;

fn shell_step(label: &str, program: &str, args: &[&str]) -> Step {
    Step::new(label, Action::Command(CommandSpec::new(program, args)))
}

#[test]
fn test_unknown_task_returns_error_without_side_effects() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("ran");

    let mut orch = orchestrator(&[]);
    orch.register(Task::new("touch", "").with_steps(vec![shell_step(
        "touch",
        "touch",
        &[marker.to_str().unwrap()],
    )]));

    let result = orch.run("no-such-task", &HashMap::new(), &mut quiet_ctx());
    assert!(matches!(result, Err(TaskError::UnknownTask(_))));
    assert!(!marker.exists());
}

#[test]
fn test_abort_task_never_reaches_later_steps() {
    let temp = TempDir::new().unwrap();
    let marker = temp.path().join("after_failure");

    let mut orch = orchestrator(&[]);
    orch.register(Task::new("t", "").with_steps(vec![
        shell_step("a", "true", &[]),
        shell_step("b", "false", &[]),
        shell_step("c", "touch", &[marker.to_str().unwrap()]),
    ]));

    let report = orch.run("t", &HashMap::new(), &mut quiet_ctx()).unwrap();
    assert!(!report.success);
    assert_eq!(report.records.len(), 2);
    assert!(!marker.exists());
}

#[test]
fn test_collect_batch_runs_every_step() {
    let temp = TempDir::new().unwrap();
    let first = temp.path().join("first");
    let last = temp.path().join("last");

    let mut orch = orchestrator(&[]);
    orch.register(Task::new("suites", "").group(StepGroup::collect_failures(vec![
        shell_step("suite 1", "touch", &[first.to_str().unwrap()]),
        shell_step("suite 2", "false", &[]),
        shell_step("suite 3", "touch", &[last.to_str().unwrap()]),
    ])));

    let report = orch.run("suites", &HashMap::new(), &mut quiet_ctx()).unwrap();
    assert!(!report.success);
    assert_eq!(report.records.len(), 3);
    assert!(first.exists());
    assert!(last.exists());
}

#[test]
fn test_prompt_answer_flows_into_later_command() {
    let temp = TempDir::new().unwrap();

    let mut orch = orchestrator(&["flagfile"]);
    orch.register(Task::new("t", "").with_steps(vec![
        Step::new(
            "ask name",
            Action::Prompt(apptask::runner::PromptSpec::new("File name?", "name")),
        ),
        shell_step("create", "touch", &["${name}"]),
    ]));

    let mut ctx = quiet_ctx().with_working_dir(temp.path().to_path_buf());
    let report = orch.run("t", &HashMap::new(), &mut ctx).unwrap();
    assert!(report.success);
    assert!(temp.path().join("flagfile").exists());
}

#[test]
fn test_clear_assets_both_areas_by_default() {
    let temp = TempDir::new().unwrap();
    for area in ["frontend", "backend"] {
        let assets = temp.path().join(area).join("web").join("assets");
        fs::create_dir_all(assets.join("a1b2c3d")).unwrap();
        fs::create_dir_all(assets.join("keepers")).unwrap();
    }

    let mut orch = orchestrator(&[]);
    register_builtin_tasks(&mut orch, &Settings::default());

    let mut ctx = quiet_ctx().with_working_dir(temp.path().to_path_buf());
    let report = orch
        .run("clear-assets", &HashMap::new(), &mut ctx)
        .unwrap();

    assert!(report.success);
    assert_eq!(report.records.len(), 2);
    for area in ["frontend", "backend"] {
        let assets = temp.path().join(area).join("web").join("assets");
        assert!(!assets.join("a1b2c3d").exists());
        assert!(assets.join("keepers").exists());
    }
}

#[test]
fn test_clear_assets_single_area_leaves_the_other() {
    let temp = TempDir::new().unwrap();
    for area in ["frontend", "backend"] {
        let assets = temp.path().join(area).join("web").join("assets");
        fs::create_dir_all(assets.join("deadbee8")).unwrap();
    }

    let mut orch = orchestrator(&[]);
    register_builtin_tasks(&mut orch, &Settings::default());

    let mut overrides = HashMap::new();
    overrides.insert("area".to_string(), "frontend".to_string());
    let mut ctx = quiet_ctx().with_working_dir(temp.path().to_path_buf());
    let report = orch.run("clear-assets", &overrides, &mut ctx).unwrap();

    assert!(report.success);
    assert_eq!(report.records.len(), 1);
    assert!(!temp
        .path()
        .join("frontend/web/assets/deadbee8")
        .exists());
    assert!(temp.path().join("backend/web/assets/deadbee8").exists());
}

#[test]
fn test_clear_assets_missing_area_fails_but_other_area_is_cleared() {
    let temp = TempDir::new().unwrap();
    // Only the backend area exists; the frontend step must fail without
    // stopping the backend step
    let backend = temp.path().join("backend/web/assets");
    fs::create_dir_all(backend.join("a1b2c3d4")).unwrap();

    let mut orch = orchestrator(&[]);
    register_builtin_tasks(&mut orch, &Settings::default());

    let mut ctx = quiet_ctx().with_working_dir(temp.path().to_path_buf());
    let report = orch
        .run("clear-assets", &HashMap::new(), &mut ctx)
        .unwrap();

    assert!(!report.success);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.failed_labels(), vec!["clear frontend assets"]);
    assert!(!backend.join("a1b2c3d4").exists());
}

#[test]
fn test_subtask_receives_override_and_caller_keeps_value() {
    let temp = TempDir::new().unwrap();

    let mut orch = orchestrator(&[]);
    orch.register(Task::new("write", "").with_steps(vec![shell_step(
        "write",
        "touch",
        &["${db}"],
    )]));
    let mut overrides = HashMap::new();
    overrides.insert("db".to_string(), "db_test".to_string());
    orch.register(Task::new("outer", "").with_steps(vec![
        Step::new(
            "sub",
            Action::Subtask {
                name: "write".to_string(),
                overrides,
            },
        ),
        shell_step("own", "touch", &["${db}"]),
    ]));

    let mut ctx = quiet_ctx().with_working_dir(temp.path().to_path_buf());
    ctx.set_var("db", "db_main");
    let report = orch.run("outer", &HashMap::new(), &mut ctx).unwrap();

    assert!(report.success);
    assert!(temp.path().join("db_test").exists());
    assert!(temp.path().join("db_main").exists());
}

#[test]
fn test_setup_runs_migrate_with_resolved_default_db() {
    env::set_var("APP_ADMIN_EMAIL", "a@b.com");
    env::set_var("APP_ADMIN_PASSWORD", "hunter2");

    let temp = TempDir::new().unwrap();
    let capture = temp.path().join("console-argv");

    // Console stand-in that records the argv it was invoked with
    let script = format!("printf '%s\\n' \"$@\" > {}", capture.display());
    let settings = Settings {
        console: vec![
            "sh".to_string(),
            "-c".to_string(),
            script,
            "console".to_string(),
        ],
        ..Settings::default()
    };

    let mut orch = orchestrator(&[]);
    register_builtin_tasks(&mut orch, &settings);

    let mut ctx = quiet_ctx()
        .with_working_dir(temp.path().to_path_buf())
        .with_interactive(false);
    ctx.set_var("interactive", "0");
    let report = orch.run("setup", &HashMap::new(), &mut ctx).unwrap();

    assert!(report.success);
    let argv = fs::read_to_string(&capture).unwrap();
    let args: Vec<&str> = argv.lines().collect();
    assert_eq!(args, vec!["migrate", "--db=db", "--interactive=0"]);
}

#[test]
fn test_declined_run_tests_confirm_runs_nothing() {
    let mut orch = orchestrator(&["n"]);
    register_builtin_tasks(&mut orch, &Settings::default());

    let mut ctx = quiet_ctx();
    let report = orch.run("run-tests", &HashMap::new(), &mut ctx).unwrap();

    // The note ran; the declined confirm gate skipped the server and suites
    assert!(report.success);
    assert_eq!(report.records.len(), 1);
    assert!(ctx.background.is_empty());
}
