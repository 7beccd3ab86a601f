//! apptask - a development task runner for two-tier web applications
//!
//! apptask runs a fixed registry of named tasks (setup, update, tests,
//! documentation, asset cleanup) as sequences of structured external
//! commands, prompts and collaborator operations, with per-group failure
//! aggregation.

// Public modules
pub mod cli;
pub mod config;
pub mod error;
pub mod runner;
pub mod tasks;
pub mod users;

// Re-export commonly used types
pub use error::{AppError, Result};

/// Current version of apptask
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
