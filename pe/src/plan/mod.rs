//! Plan data model and plan-to-text rendering
//!
//! A plan is an ordered list of steps. The orchestrator hands plans out as JSON
//! and takes them back as rendered text, one line per step:
//!
//! ```text
//! 1. Fetch data - agent: finder, arguments: {"query":"report"}
//! 2. Summarise - agent: codewriter, arguments: {}
//! ```
//!
//! Rendering is one-way; the text form is never parsed back into a [`Plan`].

mod render;
mod types;
mod validate;

pub use render::{format_plan_preview, render_plan};
pub use types::{Plan, PlanInput, Step};
pub use validate::{PlanValidationError, validate_plan};

use tracing::debug;

/// Answers accepted as approval of a proposed plan
pub const APPROVAL_WORDS: &[&str] = &["yes", "ano", "execute", "approve", "ok"];

/// Answers accepted as rejection of a proposed plan
pub const REJECTION_WORDS: &[&str] = &["no", "ne", "cancel", "reject"];

/// Check whether a user answer approves a plan
pub fn is_approval(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    debug!(%answer, "is_approval: called");
    APPROVAL_WORDS.contains(&answer.as_str())
}

/// Check whether a user answer rejects a plan
pub fn is_rejection(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    debug!(%answer, "is_rejection: called");
    REJECTION_WORDS.contains(&answer.as_str())
}
