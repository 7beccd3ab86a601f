//! Task registry and orchestration
//!
//! The orchestrator owns the registry of named tasks and the collaborators
//! (prompter, user directory) the steps need. Steps execute strictly in
//! declaration order; failure aggregation follows each group's policy.

use crate::error::{TaskError, TaskResult};
use crate::runner::{
    assets, evaluate_when_list, execute_command, interpolate, interpolate_strict, render,
    spawn_detached, tool_present, Action, FailurePolicy, Prompter, PromptSpec, RunContext, Step,
    StepGroup, StepOutcome, TaskReport, UserOp,
};
use crate::users::{UserDirectory, UserOpOutcome};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::env;
use std::time::Duration;

/// A named, ordered sequence of step groups invocable from the CLI
#[derive(Debug, Clone)]
pub struct Task {
    pub name: String,

    /// One-line usage description for help text
    pub usage: String,

    /// Parameter metadata for the CLI builder
    pub params: Vec<TaskParam>,

    pub groups: Vec<StepGroup>,
}

impl Task {
    pub fn new(name: impl Into<String>, usage: impl Into<String>) -> Self {
        Task {
            name: name.into(),
            usage: usage.into(),
            params: Vec::new(),
            groups: Vec::new(),
        }
    }

    pub fn param(mut self, param: TaskParam) -> Self {
        self.params.push(param);
        self
    }

    pub fn group(mut self, group: StepGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Shorthand for a task made of a single abort-on-first-failure group
    pub fn with_steps(self, steps: Vec<Step>) -> Self {
        self.group(StepGroup::abort_on_failure(steps))
    }
}

/// A parameter a task accepts from the command line
#[derive(Debug, Clone)]
pub struct TaskParam {
    pub name: String,
    pub usage: String,
    pub default: Option<String>,

    /// Positional argument rather than a `--name` option
    pub positional: bool,
}

impl TaskParam {
    pub fn positional(name: impl Into<String>, usage: impl Into<String>) -> Self {
        TaskParam {
            name: name.into(),
            usage: usage.into(),
            default: None,
            positional: true,
        }
    }

    pub fn option(name: impl Into<String>, usage: impl Into<String>) -> Self {
        TaskParam {
            name: name.into(),
            usage: usage.into(),
            default: None,
            positional: false,
        }
    }

    pub fn default_value(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// How a step affects the rest of its task
enum StepFlow {
    /// Step ran; record the outcome
    Recorded(StepOutcome),

    /// Gate step decided to stop the task early (success, nothing recorded)
    SkipRest,
}

/// Runs registered tasks against a [`RunContext`]
pub struct Orchestrator {
    tasks: BTreeMap<String, Task>,
    default_task: String,
    prompter: Box<dyn Prompter>,
    users: Box<dyn UserDirectory>,
}

impl Orchestrator {
    pub fn new(prompter: Box<dyn Prompter>, users: Box<dyn UserDirectory>) -> Self {
        Orchestrator {
            tasks: BTreeMap::new(),
            default_task: String::new(),
            prompter,
            users,
        }
    }

    pub fn register(&mut self, task: Task) {
        if self.default_task.is_empty() {
            self.default_task = task.name.clone();
        }
        self.tasks.insert(task.name.clone(), task);
    }

    /// Mark the task run when no name is supplied
    pub fn set_default(&mut self, name: impl Into<String>) {
        self.default_task = name.into();
    }

    pub fn default_task(&self) -> &str {
        &self.default_task
    }

    /// Registered tasks in name order
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    /// Run a task by name; an empty name selects the default task
    ///
    /// Overrides are layered over a copy of the caller's variables and the
    /// caller's variables are restored afterwards, so sub-task invocations
    /// inherit everything except what they explicitly override.
    pub fn run(
        &mut self,
        name: &str,
        overrides: &HashMap<String, String>,
        ctx: &mut RunContext,
    ) -> TaskResult<TaskReport> {
        let name = if name.is_empty() {
            self.default_task.clone()
        } else {
            name.to_string()
        };

        let task = self
            .tasks
            .get(&name)
            .cloned()
            .ok_or_else(|| TaskError::UnknownTask(name.clone()))?;

        if ctx.is_task_in_stack(&name) {
            return Err(TaskError::CyclicTask(ctx.invocation_chain(&name)));
        }
        ctx.push_task(name.clone());
        ctx.print_task_start(&name);

        let saved_vars = ctx.vars.clone();
        for (key, value) in overrides {
            ctx.set_var(key.clone(), value.clone());
        }
        // Declared parameter defaults fill anything the caller left unset,
        // so sub-task invocations resolve the same way CLI invocations do
        for param in &task.params {
            if let Some(default) = &param.default {
                if !ctx.vars.contains_key(&param.name) {
                    ctx.set_var(param.name.clone(), default.clone());
                }
            }
        }

        let result = self.execute_groups(&task, ctx);

        ctx.vars = saved_vars;
        ctx.pop_task();

        // The outermost run owns any detached children
        if ctx.task_stack.is_empty() {
            ctx.shutdown_background();
        }

        let report = result?;
        if report.success {
            ctx.print_task_complete(&name);
        } else {
            ctx.print_error(&format!(
                "Task '{}' failed: {}",
                name,
                report.failed_labels().join(", ")
            ));
        }
        Ok(report)
    }

    fn execute_groups(&mut self, task: &Task, ctx: &mut RunContext) -> TaskResult<TaskReport> {
        let mut report = TaskReport::new(&task.name);

        'groups: for group in &task.groups {
            let mut group_failed = false;

            for step in &group.steps {
                if !evaluate_when_list(&step.when, ctx) {
                    ctx.print_step_skip(&step.label, "guard condition not met");
                    continue;
                }

                match self.execute_step(step, ctx)? {
                    StepFlow::SkipRest => break 'groups,
                    StepFlow::Recorded(outcome) => {
                        let failed = !outcome.is_success();
                        report.record(&step.label, outcome);
                        if failed {
                            group_failed = true;
                            if group.policy == FailurePolicy::Abort {
                                break 'groups;
                            }
                        }
                    }
                }
            }

            // A collect group that recorded failures still stops later groups
            if group_failed {
                break 'groups;
            }
        }

        Ok(report)
    }

    fn execute_step(&mut self, step: &Step, ctx: &mut RunContext) -> TaskResult<StepFlow> {
        match &step.action {
            Action::Command(spec) => {
                if spec.detach {
                    ctx.print_run(&format!("{} &", render(spec, ctx)));
                    return Ok(StepFlow::Recorded(match spawn_detached(spec, ctx) {
                        Ok(child) => {
                            ctx.background.push(child);
                            StepOutcome::Succeeded
                        }
                        Err(e) => StepOutcome::Failed {
                            code: None,
                            message: e.to_string(),
                        },
                    }));
                }

                ctx.print_run(&render(spec, ctx));
                let output = execute_command(spec, ctx);
                ctx.echo_output(&output.stdout);
                if output.success {
                    Ok(StepFlow::Recorded(StepOutcome::Succeeded))
                } else {
                    ctx.print_error(output.stderr.trim_end());
                    Ok(StepFlow::Recorded(StepOutcome::Failed {
                        code: output.code,
                        message: output.stderr,
                    }))
                }
            }

            Action::Subtask { name, overrides } => {
                let resolved: HashMap<String, String> = overrides
                    .iter()
                    .map(|(k, v)| (k.clone(), interpolate(v, &ctx.vars)))
                    .collect();
                let sub_report = self.run(name, &resolved, ctx)?;
                Ok(StepFlow::Recorded(if sub_report.success {
                    StepOutcome::Succeeded
                } else {
                    StepOutcome::Failed {
                        code: None,
                        message: format!("task '{}' failed", name),
                    }
                }))
            }

            Action::Prompt(spec) => self.execute_prompt(spec, ctx),

            Action::Confirm { question, default } => {
                let accepted = if ctx.interactive {
                    self.prompter.confirm(question, *default)?
                } else {
                    *default
                };
                if accepted {
                    Ok(StepFlow::Recorded(StepOutcome::Succeeded))
                } else {
                    ctx.print_info("Aborted by user.");
                    Ok(StepFlow::SkipRest)
                }
            }

            Action::UserOp(op) => Ok(self.execute_user_op(op, ctx)),

            Action::RequireTool { program } => {
                if tool_present(program) {
                    Ok(StepFlow::Recorded(StepOutcome::Succeeded))
                } else {
                    ctx.echo_output(&format!("Command {} not found, skipping.\n", program));
                    Ok(StepFlow::SkipRest)
                }
            }

            Action::PurgeAssets { dir } => {
                let path = ctx.working_dir.join(interpolate(dir, &ctx.vars));
                Ok(StepFlow::Recorded(
                    match assets::purge_hashed_assets(&path) {
                        Ok(removed) => {
                            ctx.echo_output(&format!(
                                "OK - {} asset folder(s) deleted from {}.\n",
                                removed,
                                path.display()
                            ));
                            StepOutcome::Succeeded
                        }
                        Err(e) => {
                            let message = format!("{}: {}", path.display(), e);
                            ctx.print_error(&message);
                            StepOutcome::Failed {
                                code: None,
                                message,
                            }
                        }
                    },
                ))
            }

            Action::Note(message) => {
                ctx.echo_output(&format!("{}\n", interpolate(message, &ctx.vars)));
                Ok(StepFlow::Recorded(StepOutcome::Succeeded))
            }

            Action::Wait { secs } => {
                ctx.print_debug(&format!("Waiting {}s", secs));
                std::thread::sleep(Duration::from_secs(*secs));
                Ok(StepFlow::Recorded(StepOutcome::Succeeded))
            }
        }
    }

    fn execute_prompt(&mut self, spec: &PromptSpec, ctx: &mut RunContext) -> TaskResult<StepFlow> {
        let default = spec
            .env_default
            .as_ref()
            .and_then(|var| env::var(var).ok().filter(|v| !v.is_empty()))
            .or_else(|| {
                spec.default
                    .as_ref()
                    .map(|d| interpolate(d, &ctx.vars))
                    .filter(|d| !d.is_empty())
            });

        let answer = if ctx.interactive {
            self.prompter.prompt(&spec.question, default.as_deref())?
        } else {
            default.unwrap_or_default()
        };

        if answer.is_empty() {
            if spec.skip_rest_if_empty {
                ctx.print_info(&format!("No answer for '{}', skipping.", spec.question));
                return Ok(StepFlow::SkipRest);
            }
            return Ok(StepFlow::Recorded(StepOutcome::Succeeded));
        }

        ctx.set_var(spec.var.clone(), answer);
        Ok(StepFlow::Recorded(StepOutcome::Succeeded))
    }

    fn execute_user_op(&mut self, op: &UserOp, ctx: &mut RunContext) -> StepFlow {
        // Account operations must not receive unresolved placeholders, so
        // their arguments are interpolated strictly
        let strict = |s: &str, ctx: &RunContext| interpolate_strict(s, &ctx.vars);

        let outcome = match op {
            UserOp::Lookup { username, var } => {
                let username = interpolate(username, &ctx.vars);
                let found = self.users.find(&username).success;
                ctx.set_var(var.clone(), if found { "true" } else { "false" });
                ctx.print_debug(&format!(
                    "User '{}' {}",
                    username,
                    if found { "exists" } else { "does not exist" }
                ));
                return StepFlow::Recorded(StepOutcome::Succeeded);
            }
            UserOp::Create { username, email } => {
                match (strict(username, ctx), strict(email, ctx)) {
                    (Ok(username), Ok(email)) => self.users.create(&username, &email),
                    (Err(e), _) | (_, Err(e)) => UserOpOutcome::failed(e.to_string()),
                }
            }
            UserOp::SetPassword { username, password } => {
                match (strict(username, ctx), strict(password, ctx)) {
                    (Ok(username), Ok(password)) => self.users.set_password(&username, &password),
                    (Err(e), _) | (_, Err(e)) => UserOpOutcome::failed(e.to_string()),
                }
            }
            UserOp::Confirm { username } => match strict(username, ctx) {
                Ok(username) => self.users.confirm(&username),
                Err(e) => UserOpOutcome::failed(e.to_string()),
            },
        };

        ctx.echo_output(&outcome.output);
        StepFlow::Recorded(if outcome.success {
            StepOutcome::Succeeded
        } else {
            StepOutcome::Failed {
                code: None,
                message: outcome.output,
            }
        })
    }
}
