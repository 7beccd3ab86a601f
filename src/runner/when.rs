//! Guard condition evaluation
//!
//! A step runs only when all of its guard conditions hold (AND logic).

use crate::runner::{interpolate, RunContext};

/// A guard condition on a step
#[derive(Debug, Clone)]
pub enum When {
    /// Both sides are interpolated, then compared
    Equal { left: String, right: String },

    /// The variable is set to a non-empty value
    VarSet(String),

    /// The variable is unset or empty
    VarNotSet(String),

    /// The variable is unset, empty, or equal to `value`
    ///
    /// Used for area selection: an omitted selector matches every area.
    EqualOrUnset { var: String, value: String },
}

impl When {
    pub fn equal(left: impl Into<String>, right: impl Into<String>) -> Self {
        When::Equal {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Evaluate a list of conditions; all must hold
pub fn evaluate_when_list(when_list: &[When], ctx: &RunContext) -> bool {
    when_list.iter().all(|when| evaluate_when(when, ctx))
}

/// Evaluate a single condition
pub fn evaluate_when(when: &When, ctx: &RunContext) -> bool {
    match when {
        When::Equal { left, right } => {
            interpolate(left, &ctx.vars) == interpolate(right, &ctx.vars)
        }

        When::VarSet(name) => ctx.get_var(name).is_some_and(|v| !v.is_empty()),

        When::VarNotSet(name) => !ctx.get_var(name).is_some_and(|v| !v.is_empty()),

        When::EqualOrUnset { var, value } => match ctx.get_var(var) {
            Some(v) if !v.is_empty() => v == value,
            _ => true,
        },
    }
}
