//! Project settings
//!
//! This module handles discovery and parsing of the optional `apptask.yml`
//! settings file.

pub mod parse;
pub mod types;

// Re-export main types
pub use parse::*;
pub use types::*;
