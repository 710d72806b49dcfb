//! Planning prompt templates

use eyre::{Context, Result};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

/// Decision prompt: answer directly or produce a plan over the listed agents
const DECISION_TEMPLATE: &str = r#"You are a helpful AI assistant with access to these agents: {{agents}}

User asks: "{{user_message}}"

Decide:
1) If you can answer directly without using agents, respond with valid JSON:
   {"direct_answer": "<your answer here>"}.
2) If you need to use agents, respond with valid JSON containing a top-level "plan" array:
   {"plan": [{"step": 1, "description": "...", "agent": "<agent_name>", "arguments": {...} }, ...]}.

Rules:
- Return strictly valid JSON for either the direct_answer or plan case (you may include a short human message, but ensure a valid JSON object appears in the reply).
- Use agent names from the available agents list only.
- Keep plan steps small and ordered.
"#;

#[derive(Serialize)]
struct DecisionContext<'a> {
    agents: String,
    user_message: &'a str,
}

fn registry() -> Result<Handlebars<'static>> {
    let mut hb = Handlebars::new();
    hb.set_strict_mode(true);
    hb.register_escape_fn(handlebars::no_escape);
    hb.register_template_string("decision", DECISION_TEMPLATE)
        .context("Failed to register decision template")?;
    Ok(hb)
}

/// Wrap a user message in the decision prompt for the given agents
pub fn build_decision_prompt(agents: &[String], user_message: &str) -> Result<String> {
    debug!(agent_count = agents.len(), "build_decision_prompt: called");
    let hb = registry()?;
    let context = DecisionContext {
        agents: agents.join(", "),
        user_message,
    };
    hb.render("decision", &context)
        .context("Failed to render decision prompt")
}
