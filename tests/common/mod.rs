//! Common test utilities

use apptask::runner::{Orchestrator, RunContext, ScriptedPrompter, Verbosity};
use apptask::users::MemoryUserDirectory;

/// Orchestrator with scripted prompt answers and an empty user directory
#[allow(dead_code)]
pub fn orchestrator(answers: &[&str]) -> Orchestrator {
    orchestrator_with_users(answers, MemoryUserDirectory::default())
}

/// Orchestrator with scripted prompt answers and a prepared user directory
#[allow(dead_code)]
pub fn orchestrator_with_users(answers: &[&str], users: MemoryUserDirectory) -> Orchestrator {
    Orchestrator::new(Box::new(ScriptedPrompter::new(answers)), Box::new(users))
}

/// Context that prints nothing during tests
#[allow(dead_code)]
pub fn quiet_ctx() -> RunContext {
    RunContext::new().with_verbosity(Verbosity::Silent)
}
