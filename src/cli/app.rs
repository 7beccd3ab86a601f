//! Main CLI application

use crate::config::{load_settings, Settings};
use crate::error::Result;
use crate::runner::{Orchestrator, RunContext, TerminalPrompter, Verbosity};
use crate::tasks::register_builtin_tasks;
use crate::users::ConsoleUserDirectory;
use clap::{Arg, ArgAction, ArgMatches, Command};
use clap_complete::Shell;
use std::collections::HashMap;
use std::path::PathBuf;

/// CLI application
pub struct App {
    settings: Settings,
    /// Directory the run is anchored to (the settings file's directory)
    project_dir: PathBuf,
}

impl App {
    /// Create the app, discovering the settings file automatically
    pub fn new(settings_file: Option<PathBuf>) -> Result<Self> {
        let (settings, project_dir) = load_settings(settings_file.as_deref())?;
        Ok(App {
            settings,
            project_dir,
        })
    }

    /// Run with command line arguments; returns the process exit code
    pub fn run(self) -> Result<i32> {
        let mut orchestrator = Orchestrator::new(
            Box::new(TerminalPrompter),
            Box::new(ConsoleUserDirectory::new(self.settings.console.clone())),
        );
        register_builtin_tasks(&mut orchestrator, &self.settings);

        let mut command = build_command(&self.settings, &orchestrator);
        let matches = command.clone().get_matches();

        let (task_name, task_matches) = match matches.subcommand() {
            Some(("completions", sub_matches)) => {
                let shell = sub_matches
                    .get_one::<Shell>("shell")
                    .copied()
                    .unwrap_or(Shell::Bash);
                clap_complete::generate(shell, &mut command, "apptask", &mut std::io::stdout());
                return Ok(0);
            }
            Some((name, sub_matches)) => (name.to_string(), Some(sub_matches)),
            // No task given: fall back to the default task
            None => (String::new(), None),
        };

        let interactive = !matches.get_flag("no-interactive");
        let mut ctx = RunContext::new()
            .with_working_dir(self.project_dir.clone())
            .with_interactive(interactive)
            .with_verbosity(get_verbosity(&matches));
        // The migration tool and friends receive this as --interactive=${interactive}
        ctx.set_var("interactive", if interactive { "1" } else { "0" });

        let overrides = match task_matches {
            Some(sub_matches) => collect_overrides(&orchestrator, &task_name, sub_matches),
            None => HashMap::new(),
        };

        let report = orchestrator.run(&task_name, &overrides, &mut ctx)?;
        Ok(if report.success { 0 } else { 1 })
    }
}

/// Build the clap command from the registered tasks
fn build_command(settings: &Settings, orchestrator: &Orchestrator) -> Command {
    let mut cmd = Command::new(settings.name.clone().unwrap_or_else(|| "apptask".to_string()))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Development task runner")
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .help("Path to the apptask.yml settings file")
                .global(true),
        )
        .arg(
            Arg::new("no-interactive")
                .short('n')
                .long("no-interactive")
                .help("Never prompt; resolve every prompt to its default")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print command output and errors")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue)
                .global(true),
        );

    for task in orchestrator.tasks() {
        let mut task_cmd = Command::new(task.name.clone()).about(task.usage.clone());

        for param in &task.params {
            let mut arg = Arg::new(param.name.clone()).help(param.usage.clone());
            if param.positional {
                arg = arg.value_name(param.name.to_uppercase());
            } else {
                arg = arg
                    .long(param.name.clone())
                    .value_name(param.name.to_uppercase());
            }
            if let Some(default) = &param.default {
                arg = arg.default_value(default.clone());
            }
            task_cmd = task_cmd.arg(arg);
        }

        cmd = cmd.subcommand(task_cmd);
    }

    cmd.subcommand(
        Command::new("completions")
            .about("Generate shell completions")
            .arg(
                Arg::new("shell")
                    .value_name("SHELL")
                    .value_parser(clap::value_parser!(Shell))
                    .required(true),
            ),
    )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Collect a task's parameter values from its subcommand matches
fn collect_overrides(
    orchestrator: &Orchestrator,
    task_name: &str,
    matches: &ArgMatches,
) -> HashMap<String, String> {
    let mut overrides = HashMap::new();

    let Some(task) = orchestrator.tasks().find(|t| t.name == task_name) else {
        return overrides;
    };

    for param in &task.params {
        if let Some(value) = matches.get_one::<String>(&param.name) {
            if !value.is_empty() {
                overrides.insert(param.name.clone(), value.clone());
            }
        }
    }

    overrides
}

/// Run the CLI application
pub fn run() -> Result<i32> {
    // The settings file location must be known before clap parsing, the
    // same way the task list itself is needed to build the parser
    let args: Vec<String> = std::env::args().collect();
    let app = App::new(extract_file_arg(&args))?;
    app.run()
}

/// Extract the --file argument before clap parsing
fn extract_file_arg(args: &[String]) -> Option<PathBuf> {
    for i in 0..args.len() {
        if (args[i] == "--file" || args[i] == "-f") && i + 1 < args.len() {
            return Some(PathBuf::from(&args[i + 1]));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ScriptedPrompter;
    use crate::users::MemoryUserDirectory;

    fn test_orchestrator() -> Orchestrator {
        let mut orch = Orchestrator::new(
            Box::new(ScriptedPrompter::new(&[])),
            Box::new(MemoryUserDirectory::default()),
        );
        register_builtin_tasks(&mut orch, &Settings::default());
        orch
    }

    #[test]
    fn test_get_verbosity_normal() {
        let cmd = Command::new("test")
            .arg(Arg::new("quiet").long("quiet").action(ArgAction::SetTrue))
            .arg(Arg::new("silent").long("silent").action(ArgAction::SetTrue))
            .arg(Arg::new("verbose").long("verbose").action(ArgAction::SetTrue));
        let matches = cmd.get_matches_from(vec!["test"]);
        assert_eq!(get_verbosity(&matches), Verbosity::Normal);
    }

    #[test]
    fn test_extract_file_arg() {
        let args = vec![
            "apptask".to_string(),
            "--file".to_string(),
            "settings.yml".to_string(),
        ];
        assert_eq!(
            extract_file_arg(&args),
            Some(PathBuf::from("settings.yml"))
        );

        let args = vec!["apptask".to_string(), "version".to_string()];
        assert_eq!(extract_file_arg(&args), None);
    }

    #[test]
    fn test_command_has_subcommand_per_task() {
        let orch = test_orchestrator();
        let cmd = build_command(&Settings::default(), &orch);
        let names: Vec<&str> = cmd.get_subcommands().map(|c| c.get_name()).collect();
        assert!(names.contains(&"version"));
        assert!(names.contains(&"run-tests"));
        assert!(names.contains(&"clear-assets"));
        assert!(names.contains(&"completions"));
    }

    #[test]
    fn test_collect_overrides_for_migrate() {
        let orch = test_orchestrator();
        let cmd = build_command(&Settings::default(), &orch);
        let matches = cmd.get_matches_from(vec!["apptask", "migrate", "--db", "db_test"]);
        let (name, sub) = matches.subcommand().unwrap();

        let overrides = collect_overrides(&orch, name, sub);
        assert_eq!(overrides.get("db"), Some(&"db_test".to_string()));
    }

    #[test]
    fn test_clear_assets_area_is_optional() {
        let orch = test_orchestrator();
        let cmd = build_command(&Settings::default(), &orch);
        let matches = cmd.get_matches_from(vec!["apptask", "clear-assets"]);
        let (name, sub) = matches.subcommand().unwrap();

        let overrides = collect_overrides(&orch, name, sub);
        assert!(overrides.get("area").is_none());
    }
}
