//! Step and report types
//!
//! A task is an ordered list of step groups; each group carries a failure
//! policy and an ordered list of steps. Steps are plain data; the
//! orchestrator in [`crate::runner::task`] interprets them.

use crate::runner::When;
use std::collections::HashMap;
use std::time::Duration;

/// Failure policy for a step group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Stop the task at the first failed step
    Abort,

    /// Attempt every step; the group fails if any step failed
    Collect,
}

/// An ordered list of steps sharing one failure policy
#[derive(Debug, Clone)]
pub struct StepGroup {
    pub policy: FailurePolicy,
    pub steps: Vec<Step>,
}

impl StepGroup {
    pub fn abort_on_failure(steps: Vec<Step>) -> Self {
        StepGroup {
            policy: FailurePolicy::Abort,
            steps,
        }
    }

    pub fn collect_failures(steps: Vec<Step>) -> Self {
        StepGroup {
            policy: FailurePolicy::Collect,
            steps,
        }
    }
}

/// One unit of work within a task
#[derive(Debug, Clone)]
pub struct Step {
    /// Short label used in output and reports
    pub label: String,

    /// Guard conditions; the step is skipped unless all hold
    pub when: Vec<When>,

    pub action: Action,
}

impl Step {
    pub fn new(label: impl Into<String>, action: Action) -> Self {
        Step {
            label: label.into(),
            when: Vec::new(),
            action,
        }
    }

    /// Add a guard condition
    pub fn when(mut self, condition: When) -> Self {
        self.when.push(condition);
        self
    }
}

/// What a step does
#[derive(Debug, Clone)]
pub enum Action {
    /// Execute an external command
    Command(CommandSpec),

    /// Invoke another registered task with parameter overrides
    Subtask {
        name: String,
        overrides: HashMap<String, String>,
    },

    /// Ask the user for a line of input and store it in a variable
    Prompt(PromptSpec),

    /// Ask the user a yes/no question; declining skips the rest of the task
    Confirm { question: String, default: bool },

    /// An account operation through the user-directory collaborator
    UserOp(UserOp),

    /// Skip the rest of the task with a notice if a helper is not on PATH
    RequireTool { program: String },

    /// Remove hashed asset folders from a directory
    PurgeAssets { dir: String },

    /// Echo a message
    Note(String),

    /// Sleep for a fixed delay
    Wait { secs: u64 },
}

/// A structured external command: program plus argument list
///
/// Arguments are interpolated against the run context at execution time.
/// No shell is involved.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,

    /// Working directory, relative to the context's working directory
    pub dir: Option<String>,

    /// Launch without waiting; the child is reaped at the end of the run
    pub detach: bool,

    /// Kill the child and report failure if it runs longer than this
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>, args: &[&str]) -> Self {
        CommandSpec {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            dir: None,
            detach: false,
            timeout: None,
        }
    }

    /// Build from an argv-style vector (first element is the program)
    pub fn from_argv(argv: &[String]) -> Self {
        let (program, args) = match argv.split_first() {
            Some((p, rest)) => (p.clone(), rest.to_vec()),
            None => (String::new(), Vec::new()),
        };
        CommandSpec {
            program,
            args,
            dir: None,
            detach: false,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn detached(mut self) -> Self {
        self.detach = true;
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

/// An interactive line prompt
#[derive(Debug, Clone)]
pub struct PromptSpec {
    pub question: String,

    /// Variable receiving the answer; only set when the answer is non-empty
    pub var: String,

    /// Fallback default, interpolated against the context
    pub default: Option<String>,

    /// Environment variable consulted for the default before `default`
    pub env_default: Option<String>,

    /// An empty answer skips the remaining steps of the task
    pub skip_rest_if_empty: bool,
}

impl PromptSpec {
    pub fn new(question: impl Into<String>, var: impl Into<String>) -> Self {
        PromptSpec {
            question: question.into(),
            var: var.into(),
            default: None,
            env_default: None,
            skip_rest_if_empty: false,
        }
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn env_default(mut self, env_var: impl Into<String>) -> Self {
        self.env_default = Some(env_var.into());
        self
    }

    pub fn skip_rest_if_empty(mut self) -> Self {
        self.skip_rest_if_empty = true;
        self
    }
}

/// Account operations performed through the user-directory collaborator
///
/// String fields are interpolated against the run context, so a password
/// collected by an earlier prompt step can be referenced as `${admin_password}`.
#[derive(Debug, Clone)]
pub enum UserOp {
    /// Look up an account; stores "true"/"false" into `var`
    Lookup { username: String, var: String },
    Create { username: String, email: String },
    SetPassword { username: String, password: String },
    Confirm { username: String },
}

/// Outcome of one executed step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Succeeded,
    Failed {
        /// Exit code when the step ran a command and one was available
        code: Option<i32>,
        message: String,
    },
}

impl StepOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, StepOutcome::Succeeded)
    }
}

/// Record of one executed step; never mutated once pushed into a report
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub label: String,
    pub outcome: StepOutcome,
}

/// Aggregate result of one task run
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: String,
    pub records: Vec<StepRecord>,
    pub success: bool,
}

impl TaskReport {
    pub fn new(task: impl Into<String>) -> Self {
        TaskReport {
            task: task.into(),
            records: Vec::new(),
            success: true,
        }
    }

    pub fn record(&mut self, label: &str, outcome: StepOutcome) {
        if !outcome.is_success() {
            self.success = false;
        }
        self.records.push(StepRecord {
            label: label.to_string(),
            outcome,
        });
    }

    pub fn failed_labels(&self) -> Vec<&str> {
        self.records
            .iter()
            .filter(|r| !r.outcome.is_success())
            .map(|r| r.label.as_str())
            .collect()
    }
}
