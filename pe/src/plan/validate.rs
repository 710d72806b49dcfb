//! Structural validation of plan JSON

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Reasons a plan value is not well formed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanValidationError {
    #[error("Plan must be a JSON object")]
    NotAnObject,

    #[error("Top-level 'plan' must be an array")]
    MissingPlanArray,

    #[error("Step {0} is not an object")]
    StepNotObject(usize),

    #[error("Step {0} missing 'agent' name")]
    MissingAgent(usize),

    #[error("Step {0} 'description' must be a string")]
    BadDescription(usize),

    #[error("Step {0} 'arguments' must be an object")]
    BadArguments(usize),
}

/// Validate a `{"plan": [...]}` value, reporting the first problem found
///
/// Step numbers in errors are 1-based positions.
pub fn validate_plan(value: &Value) -> Result<(), PlanValidationError> {
    debug!("validate_plan: called");
    let map = value.as_object().ok_or(PlanValidationError::NotAnObject)?;
    let steps = map
        .get("plan")
        .and_then(Value::as_array)
        .ok_or(PlanValidationError::MissingPlanArray)?;

    for (position, step) in steps.iter().enumerate() {
        let number = position + 1;
        let step = step.as_object().ok_or(PlanValidationError::StepNotObject(number))?;

        match step.get("agent").and_then(Value::as_str) {
            Some(agent) if !agent.is_empty() => {}
            _ => return Err(PlanValidationError::MissingAgent(number)),
        }
        if step.get("description").is_some_and(|d| !d.is_string()) {
            return Err(PlanValidationError::BadDescription(number));
        }
        if step.get("arguments").is_some_and(|a| !a.is_object()) {
            return Err(PlanValidationError::BadArguments(number));
        }
    }

    debug!(step_count = steps.len(), "validate_plan: valid");
    Ok(())
}
