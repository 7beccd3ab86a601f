//! User-directory collaborator
//!
//! Account management lives in the application's own console tool; the
//! orchestrator only needs lookup, create, set-password and confirm by
//! username. The trait keeps admin-user setup testable without spawning the
//! real tool.

use crate::runner::{execute_command, CommandSpec, RunContext};
use std::sync::{Arc, Mutex};

/// Outcome of a single account operation
#[derive(Debug, Clone)]
pub struct UserOpOutcome {
    pub success: bool,
    pub output: String,
}

impl UserOpOutcome {
    pub fn ok() -> Self {
        UserOpOutcome {
            success: true,
            output: String::new(),
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        UserOpOutcome {
            success: false,
            output: output.into(),
        }
    }
}

/// Directory of application user accounts
pub trait UserDirectory {
    /// Whether an account with this username exists
    fn find(&mut self, username: &str) -> UserOpOutcome;

    fn create(&mut self, username: &str, email: &str) -> UserOpOutcome;

    fn set_password(&mut self, username: &str, password: &str) -> UserOpOutcome;

    /// Confirm (activate) the account
    fn confirm(&mut self, username: &str) -> UserOpOutcome;
}

/// User directory backed by the application console tool
///
/// Each operation is one invocation of the configured argv prefix plus a
/// `user/<op>` route, e.g. `./yii user/create admin@example.com admin`.
pub struct ConsoleUserDirectory {
    tool: Vec<String>,
}

impl ConsoleUserDirectory {
    pub fn new(tool: Vec<String>) -> Self {
        ConsoleUserDirectory { tool }
    }

    fn run(&self, route: &str, args: &[&str]) -> UserOpOutcome {
        let mut argv = self.tool.clone();
        argv.push(route.to_string());
        argv.extend(args.iter().map(|a| a.to_string()));

        let spec = CommandSpec::from_argv(&argv);
        // Arguments are already resolved; a throwaway context is enough here
        let output = execute_command(&spec, &RunContext::new());

        UserOpOutcome {
            success: output.success,
            output: if output.success {
                output.stdout
            } else {
                format!("{}{}", output.stdout, output.stderr)
            },
        }
    }
}

impl UserDirectory for ConsoleUserDirectory {
    fn find(&mut self, username: &str) -> UserOpOutcome {
        self.run("user/find", &[username])
    }

    fn create(&mut self, username: &str, email: &str) -> UserOpOutcome {
        self.run("user/create", &[email, username])
    }

    fn set_password(&mut self, username: &str, password: &str) -> UserOpOutcome {
        self.run("user/password", &[username, password])
    }

    fn confirm(&mut self, username: &str) -> UserOpOutcome {
        self.run("user/confirm", &[username])
    }
}

/// In-memory user directory for tests
///
/// Clones share state, so a test can keep a handle and inspect the
/// operations performed after handing a clone to the orchestrator.
#[derive(Default, Clone)]
pub struct MemoryUserDirectory {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    existing: Vec<String>,
    calls: Vec<String>,
}

impl MemoryUserDirectory {
    pub fn with_existing(usernames: &[&str]) -> Self {
        let dir = MemoryUserDirectory::default();
        dir.state.lock().unwrap().existing = usernames.iter().map(|u| u.to_string()).collect();
        dir
    }

    /// Operations performed so far, rendered as "op username [detail]"
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn exists(&self, username: &str) -> bool {
        self.state
            .lock()
            .unwrap()
            .existing
            .iter()
            .any(|u| u == username)
    }
}

impl UserDirectory for MemoryUserDirectory {
    fn find(&mut self, username: &str) -> UserOpOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("find {}", username));
        if state.existing.iter().any(|u| u == username) {
            UserOpOutcome::ok()
        } else {
            UserOpOutcome::failed(format!("user '{}' not found", username))
        }
    }

    fn create(&mut self, username: &str, email: &str) -> UserOpOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("create {} {}", username, email));
        state.existing.push(username.to_string());
        UserOpOutcome::ok()
    }

    fn set_password(&mut self, username: &str, password: &str) -> UserOpOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("password {} {}", username, password));
        UserOpOutcome::ok()
    }

    fn confirm(&mut self, username: &str) -> UserOpOutcome {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("confirm {}", username));
        if state.existing.iter().any(|u| u == username) {
            UserOpOutcome::ok()
        } else {
            UserOpOutcome::failed(format!("user '{}' not found", username))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_directory_find() {
        let mut dir = MemoryUserDirectory::with_existing(&["admin"]);
        assert!(dir.find("admin").success);
        assert!(!dir.find("nobody").success);
    }

    #[test]
    fn test_memory_directory_create_then_confirm() {
        let mut dir = MemoryUserDirectory::default();
        assert!(!dir.find("admin").success);

        dir.create("admin", "a@b.com");
        assert!(dir.find("admin").success);
        assert!(dir.confirm("admin").success);
        assert_eq!(
            dir.calls(),
            vec![
                "find admin",
                "create admin a@b.com",
                "find admin",
                "confirm admin"
            ]
        );
    }

    #[test]
    fn test_memory_directory_clones_share_state() {
        let dir = MemoryUserDirectory::default();
        let mut clone = dir.clone();
        clone.create("admin", "a@b.com");

        assert!(dir.exists("admin"));
        assert_eq!(dir.calls(), vec!["create admin a@b.com"]);
    }
}
