//! Run context threaded through a task run and its sub-tasks

use colored::Colorize;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::process::Child;

/// State owned by one orchestrator invocation
///
/// Sub-task invocations see the caller's variables with their overrides
/// applied; the caller's variables are restored when the sub-task returns.
pub struct RunContext {
    /// Current working directory
    pub working_dir: PathBuf,

    /// Whether prompts may block for user input
    pub interactive: bool,

    /// Resolved parameters and prompt answers
    pub vars: HashMap<String, String>,

    /// Stack of tasks being executed, outermost first (cycle guard)
    pub task_stack: Vec<String>,

    /// Children launched detached; killed and reaped when the run ends
    pub background: Vec<Child>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

impl RunContext {
    /// Create a new context with default settings
    pub fn new() -> Self {
        RunContext {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            interactive: true,
            vars: HashMap::new(),
            task_stack: Vec::new(),
            background: Vec::new(),
            verbosity: Verbosity::Normal,
        }
    }

    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    pub fn with_vars(mut self, vars: HashMap<String, String>) -> Self {
        self.vars = vars;
        self
    }

    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn get_var(&self, key: &str) -> Option<&String> {
        self.vars.get(key)
    }

    /// Push a task onto the execution stack
    pub fn push_task(&mut self, task_name: String) {
        self.task_stack.push(task_name);
    }

    /// Pop a task from the execution stack
    pub fn pop_task(&mut self) -> Option<String> {
        self.task_stack.pop()
    }

    /// Check whether a task is already being executed (cycle detection)
    pub fn is_task_in_stack(&self, task_name: &str) -> bool {
        self.task_stack.iter().any(|t| t == task_name)
    }

    /// The invocation chain including `next`, for cycle error messages
    pub fn invocation_chain(&self, next: &str) -> String {
        let mut chain = self.task_stack.clone();
        chain.push(next.to_string());
        chain.join(" -> ")
    }

    /// Kill and reap every detached child
    ///
    /// Kill errors are ignored: the child may have exited on its own.
    pub fn shutdown_background(&mut self) {
        for mut child in self.background.drain(..) {
            let _ = child.kill();
            let _ = child.wait();
        }
    }

    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[INFO]".cyan(), message);
        }
    }

    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}", "[ERROR]".red(), message);
        }
    }

    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}", "[DEBUG]".dimmed(), message);
        }
    }

    pub fn print_run(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}", "[RUN]".green(), message);
        }
    }

    /// Echo a step's captured output at normal verbosity
    pub fn echo_output(&self, output: &str) {
        if self.verbosity >= Verbosity::Normal && !output.is_empty() {
            print!("{}", output);
            if !output.ends_with('\n') {
                println!();
            }
        }
    }

    pub fn print_task_start(&self, task_name: &str) {
        self.print_info(&format!("Running task: {}", task_name));
    }

    pub fn print_task_complete(&self, task_name: &str) {
        self.print_debug(&format!("Task completed: {}", task_name));
    }

    pub fn print_step_skip(&self, label: &str, reason: &str) {
        self.print_debug(&format!("Skipping step '{}': {}", label, reason));
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RunContext {
    fn drop(&mut self) {
        // Detached children must not outlive the run
        self.shutdown_background();
    }
}
