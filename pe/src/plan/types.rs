//! Plan and step types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Shape of a plan-like JSON value
///
/// Orchestrator replies carry plans either wrapped in an object with a `plan`
/// field or as a bare array of steps, and sometimes not at all.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanInput<'a> {
    /// No plan value
    Absent,
    /// `{"plan": [...]}`
    Wrapped(&'a [Value]),
    /// `[...]`
    Steps(&'a [Value]),
}

impl<'a> PlanInput<'a> {
    /// Classify an optional JSON value
    ///
    /// Values that are neither a wrapped plan nor an array (an object without
    /// a `plan` array, a scalar, `null`) carry no steps and map to `Absent`.
    pub fn from_value(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Object(map)) => match map.get("plan") {
                Some(Value::Array(steps)) => Self::Wrapped(steps),
                _ => {
                    debug!("PlanInput::from_value: object without plan array");
                    Self::Absent
                }
            },
            Some(Value::Array(steps)) => Self::Steps(steps),
            Some(other) => {
                debug!(?other, "PlanInput::from_value: not a plan shape");
                Self::Absent
            }
            None => Self::Absent,
        }
    }

    /// Raw step values in execution order
    pub fn steps(&self) -> &'a [Value] {
        match self {
            Self::Absent => &[],
            Self::Wrapped(steps) | Self::Steps(steps) => steps,
        }
    }
}

/// One unit of work in a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Display index: the explicit `step` or `index` value, else the 1-based position
    pub index: String,
    pub description: String,
    /// Executing agent, possibly empty
    #[serde(rename = "agent")]
    pub agent_name: String,
    /// Arguments passed to the agent, normally an object
    pub arguments: Value,
}

impl Step {
    /// Build a step from its JSON form at `position` (0-based) in the plan
    ///
    /// The index comes from the `step` field, then `index`, then the position;
    /// empty values (`null`, `0`, `""`, `false`, `[]`, `{}`) count as unset.
    /// Non-object values become an empty step at that position.
    pub fn from_value(value: &Value, position: usize) -> Self {
        let fallback = (position + 1).to_string();
        let Some(map) = value.as_object() else {
            debug!(%position, "Step::from_value: step is not an object");
            return Self {
                index: fallback,
                description: String::new(),
                agent_name: String::new(),
                arguments: Value::Object(Map::new()),
            };
        };

        let index = map
            .get("step")
            .filter(|v| is_set(v))
            .or_else(|| map.get("index").filter(|v| is_set(v)))
            .map(value_as_text)
            .unwrap_or(fallback);

        let description = map
            .get("description")
            .map(value_as_text)
            .unwrap_or_default();
        let agent_name = map.get("agent").map(value_as_text).unwrap_or_default();
        let arguments = match map.get("arguments") {
            Some(args) if is_set(args) => args.clone(),
            _ => Value::Object(Map::new()),
        };

        Self {
            index,
            description,
            agent_name,
            arguments,
        }
    }
}

/// False for the empty values a reply uses to mean "not given"
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

fn value_as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Ordered sequence of steps; sequence order is execution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    #[serde(rename = "plan")]
    pub steps: Vec<Step>,
}

impl Plan {
    /// Build a typed plan from any plan-like JSON value
    pub fn from_value(value: Option<&Value>) -> Self {
        Self::from_input(PlanInput::from_value(value))
    }

    pub fn from_input(input: PlanInput<'_>) -> Self {
        let steps = input
            .steps()
            .iter()
            .enumerate()
            .map(|(position, step)| Step::from_value(step, position))
            .collect();
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}
