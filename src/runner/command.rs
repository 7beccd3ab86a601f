//! External command execution
//!
//! Commands are structured program + argument lists; no shell is spawned and
//! arguments are interpolated individually, so values containing spaces or
//! metacharacters pass through unchanged.

use crate::runner::{interpolate, interpolate_list, CommandSpec, RunContext};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

/// Captured result of a blocking command execution
///
/// A non-zero exit is reported here, never raised. Spawn failures and
/// timeouts are folded into a failed outcome with an explanatory message
/// in `stderr`.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    fn spawn_failure(message: String) -> Self {
        CommandOutput {
            success: false,
            code: None,
            stdout: String::new(),
            stderr: message,
        }
    }
}

/// Render the command line for display
pub fn render(spec: &CommandSpec, ctx: &RunContext) -> String {
    let mut parts = vec![interpolate(&spec.program, &ctx.vars)];
    parts.extend(interpolate_list(&spec.args, &ctx.vars));
    parts.join(" ")
}

fn build_command(spec: &CommandSpec, ctx: &RunContext) -> Command {
    let mut command = Command::new(interpolate(&spec.program, &ctx.vars));
    command.args(interpolate_list(&spec.args, &ctx.vars));

    let working_dir = match &spec.dir {
        Some(dir) => ctx.working_dir.join(interpolate(dir, &ctx.vars)),
        None => ctx.working_dir.clone(),
    };
    command.current_dir(working_dir);

    command
}

/// Run a command to completion, capturing stdout, stderr and the exit status
pub fn execute_command(spec: &CommandSpec, ctx: &RunContext) -> CommandOutput {
    let mut command = build_command(spec, ctx);
    command.stdin(Stdio::null());
    command.stdout(Stdio::piped());
    command.stderr(Stdio::piped());

    match spec.timeout {
        None => match command.output() {
            Ok(output) => CommandOutput {
                success: output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            },
            Err(e) => CommandOutput::spawn_failure(format!(
                "failed to execute '{}': {}",
                render(spec, ctx),
                e
            )),
        },
        Some(timeout) => {
            let child = match command.spawn() {
                Ok(child) => child,
                Err(e) => {
                    return CommandOutput::spawn_failure(format!(
                        "failed to execute '{}': {}",
                        render(spec, ctx),
                        e
                    ))
                }
            };
            wait_with_timeout(child, timeout)
        }
    }
}

/// Poll the child until it exits or the deadline passes, then collect output
fn wait_with_timeout(mut child: Child, timeout: Duration) -> CommandOutput {
    let deadline = Instant::now() + timeout;
    let mut timed_out = false;

    loop {
        match child.try_wait() {
            Ok(Some(_)) => break,
            Ok(None) => {
                if Instant::now() >= deadline {
                    let _ = child.kill();
                    timed_out = true;
                    break;
                }
                std::thread::sleep(Duration::from_millis(25));
            }
            Err(_) => break,
        }
    }

    match child.wait_with_output() {
        Ok(output) => {
            let mut stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            if timed_out {
                stderr = format!("timed out after {}s\n{}", timeout.as_secs(), stderr);
            }
            CommandOutput {
                success: !timed_out && output.status.success(),
                code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr,
            }
        }
        Err(e) => CommandOutput::spawn_failure(format!("failed to collect output: {}", e)),
    }
}

/// Launch a command without waiting for it (fire-and-forget steps)
///
/// The child's output is discarded; the caller owns the handle and must
/// reap it when the run ends.
pub fn spawn_detached(spec: &CommandSpec, ctx: &RunContext) -> std::io::Result<Child> {
    let mut command = build_command(spec, ctx);
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());
    command.stderr(Stdio::null());
    command.spawn()
}

/// Check whether a program is resolvable on PATH
pub fn tool_present(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
