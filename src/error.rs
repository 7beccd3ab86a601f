//! Error types for apptask

use std::io;
use thiserror::Error;

/// Result type alias for apptask operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Main error type for apptask
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task orchestration errors
    #[error("Task error: {0}")]
    Task(#[from] TaskError),

    /// Variable interpolation errors
    #[error("Interpolation error: {0}")]
    Interpolation(#[from] InterpolationError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Settings file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read settings file '{path}': {error}")]
    Unreadable { path: String, error: String },
}

/// Task resolution and orchestration errors
///
/// A non-zero exit from a shell step is not an error: it is recorded in the
/// step's outcome and surfaced through the task report.
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Task '{0}' is not registered")]
    UnknownTask(String),

    #[error("Cyclic task invocation: {0}")]
    CyclicTask(String),

    #[error("Failed to read prompt input: {0}")]
    PromptIo(String),
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),
}

/// Specialized result type for task orchestration
pub type TaskResult<T> = std::result::Result<T, TaskError>;

/// Specialized result type for interpolation
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;
