//! Plan rendering

use serde_json::{Value, json};
use tracing::debug;

use super::types::{Plan, PlanInput, Step};

impl Step {
    /// Render this step as one plan line
    pub fn render(&self) -> String {
        let arguments =
            serde_json::to_string(&self.arguments).unwrap_or_else(|_| self.arguments.to_string());
        format!(
            "{}. {} - agent: {}, arguments: {}",
            self.index, self.description, self.agent_name, arguments
        )
    }
}

impl Plan {
    /// Render the plan as newline-joined step lines, without a trailing newline
    pub fn render(&self) -> String {
        debug!(step_count = self.steps.len(), "Plan::render: called");
        self.steps.iter().map(Step::render).collect::<Vec<_>>().join("\n")
    }
}

/// Render any plan-like JSON value into the execution payload text
///
/// Absent values and values without steps render to the empty string.
pub fn render_plan(value: Option<&Value>) -> String {
    Plan::from_input(PlanInput::from_value(value)).render()
}

/// Human-facing preview of a proposed plan, ending in an approval question
pub fn format_plan_preview(value: &Value) -> String {
    let wrapped;
    let shown = if value.is_object() {
        value
    } else {
        wrapped = json!({ "plan": value });
        &wrapped
    };
    let pretty = serde_json::to_string_pretty(shown).unwrap_or_else(|_| shown.to_string());

    format!(
        "Proposed plan:\n\n{}\n\nApprove and execute this plan? Answer 'yes' to run it or 'no' to cancel.",
        pretty
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_absent_render_empty() {
        assert_eq!(render_plan(None), "");
        assert_eq!(render_plan(Some(&json!({"plan": []}))), "");
        assert_eq!(render_plan(Some(&json!([]))), "");
        assert_eq!(render_plan(Some(&json!({"direct_answer": "hi"}))), "");
    }

    #[test]
    fn test_render_single_step_exact() {
        let value = json!({"plan": [{"step": 2, "description": "x", "agent": "a", "arguments": {"k": 1}}]});
        assert_eq!(render_plan(Some(&value)), "2. x - agent: a, arguments: {\"k\":1}");
    }

    #[test]
    fn test_position_fallback_index() {
        let value = json!([{"description": "first", "agent": "finder"}]);
        assert_eq!(render_plan(Some(&value)), "1. first - agent: finder, arguments: {}");
    }

    #[test]
    fn test_lines_joined_without_trailing_newline() {
        let value = json!({"plan": [
            {"description": "Fetch data", "agent": "finder", "arguments": {"query": "report"}},
            {"index": 5, "description": "Write", "agent": "codewriter", "arguments": {"task": "html"}}
        ]});
        let text = render_plan(Some(&value));
        assert_eq!(
            text,
            "1. Fetch data - agent: finder, arguments: {\"query\":\"report\"}\n\
             5. Write - agent: codewriter, arguments: {\"task\":\"html\"}"
        );
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn test_empty_explicit_values_fall_back() {
        let value = json!({"plan": [
            {"step": 0, "index": 5, "description": "a", "agent": "x"},
            {"step": 0, "description": "b", "agent": "x"},
            {"step": "A", "description": "c", "agent": "x"},
            {"description": "d", "agent": "x", "arguments": []}
        ]});
        assert_eq!(
            render_plan(Some(&value)),
            "5. a - agent: x, arguments: {}\n\
             2. b - agent: x, arguments: {}\n\
             A. c - agent: x, arguments: {}\n\
             4. d - agent: x, arguments: {}"
        );
    }

    #[test]
    fn test_argument_key_order_is_preserved() {
        let value: Value = serde_json::from_str(r#"[{"agent": "a", "arguments": {"z": 1, "a": 2}}]"#).unwrap();
        assert_eq!(render_plan(Some(&value)), "1.  - agent: a, arguments: {\"z\":1,\"a\":2}");
    }

    #[test]
    fn test_non_object_arguments_render_as_json() {
        let value = json!([{"description": "d", "agent": "a", "arguments": "free text"}]);
        assert_eq!(render_plan(Some(&value)), "1. d - agent: a, arguments: \"free text\"");
    }

    #[test]
    fn test_rendered_text_is_not_a_plan() {
        let value = json!({"plan": [{"description": "run X", "agent": "worker"}]});
        let text = render_plan(Some(&value));
        assert_eq!(text, "1. run X - agent: worker, arguments: {}");
        assert_eq!(crate::extract::extract_first_json(&text), Some(json!({})));
    }

    #[test]
    fn test_preview_wraps_bare_sequence() {
        let preview = format_plan_preview(&json!([{"agent": "a"}]));
        assert!(preview.contains("\"plan\""));
        assert!(preview.contains("\"agent\": \"a\""));
        assert!(preview.ends_with("'no' to cancel."));
    }
}
