//! Task orchestration engine
//!
//! This module holds the orchestrator core: the run context, step and report
//! types, external command execution, prompting, guard conditions, variable
//! interpolation and asset cleanup.

pub mod assets;
pub mod command;
pub mod context;
pub mod interpolate;
pub mod prompt;
pub mod step;
pub mod task;
pub mod when;

// Re-export main types
pub use command::*;
pub use context::*;
pub use interpolate::*;
pub use prompt::*;
pub use step::*;
pub use task::*;
pub use when::*;
