//! Orchestrator HTTP client
//!
//! Implements planning requests against the orchestrator's OpenAI-style chat
//! completions endpoint and streaming plan execution against `/plan/stream`.

use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{ClientError, ExecutionHandle, ExecutionState};
use crate::config::ResolvedOrchestratorConfig;
use crate::extract::{ExtractionMethod, extract_first_json, extract_payload};
use crate::plan::{Plan, render_plan};
use crate::stream::{StreamEvent, Terminal, pump, send_terminal};

/// Where a reply's structured plan came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanSource {
    /// The response's top-level `plan_json` field
    ResponseField,
    /// Recovered from the assistant text
    Text(ExtractionMethod),
}

/// Reply to a planning request
#[derive(Debug, Clone, PartialEq)]
pub struct PlanReply {
    /// Assistant free text
    pub text: String,
    /// Structured plan, if one was found
    pub plan_json: Option<Value>,
    pub source: PlanSource,
}

impl PlanReply {
    /// Typed view of the structured plan
    pub fn plan(&self) -> Option<Plan> {
        self.plan_json.as_ref().map(|v| Plan::from_value(Some(v)))
    }
}

/// Client for a plan orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorClient {
    base_url: String,
    model: String,
    temperature: f64,
    http: Client,
}

impl OrchestratorClient {
    /// Create a new client from resolved configuration
    ///
    /// Only a connect timeout is set: executions stream for as long as the
    /// orchestrator keeps working, and callers stop them by cancelling.
    pub fn from_config(config: &ResolvedOrchestratorConfig) -> Result<Self, ClientError> {
        debug!(?config, "from_config: called");
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self {
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Build the planning request body
    fn build_plan_request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": self.temperature,
        })
    }

    /// Ask the orchestrator for a plan
    ///
    /// Single attempt, no retry. A structured plan in the response's
    /// `plan_json` field wins over one recovered from the assistant text.
    pub async fn request_plan(&self, prompt: &str) -> Result<PlanReply, ClientError> {
        debug!(%self.model, prompt_len = prompt.len(), "request_plan: called");
        let url = self.url("chat/completions");
        let body = self.build_plan_request_body(prompt);

        info!(%url, "request_plan: sending planning request");
        let response = self.http.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "request_plan: API error");
            return Err(ClientError::ApiError {
                status: status.as_u16(),
                message: text,
            });
        }

        let text = response.text().await?;
        let envelope: CompletionEnvelope = serde_json::from_str(&text)?;
        parse_plan_reply(envelope)
    }

    /// Render a structured plan and start streaming its execution
    pub fn approve_and_execute(&self, plan: Option<&Value>, sink: mpsc::Sender<StreamEvent>) -> ExecutionHandle {
        debug!("approve_and_execute: called");
        let rendered = render_plan(plan);
        self.stream_plan(&rendered, &self.model, sink)
    }

    /// Start streaming the execution of a rendered plan
    ///
    /// Returns immediately. A spawned task owns the request, reads the body and
    /// is the only sender into `sink`; it ends every execution with exactly one
    /// `finished`, `cancelled` or `error` event. Must be called inside a tokio
    /// runtime.
    pub fn stream_plan(&self, rendered_plan: &str, model: &str, sink: mpsc::Sender<StreamEvent>) -> ExecutionHandle {
        let id = Uuid::now_v7().to_string();
        debug!(%id, %model, plan_len = rendered_plan.len(), "stream_plan: called");

        let request = self
            .http
            .post(self.url("plan/stream"))
            .header("accept", "text/event-stream")
            .json(&json!({ "plan": rendered_plan, "model": model }));

        let cancel = CancellationToken::new();
        let (state_tx, state_rx) = watch::channel(ExecutionState::Idle);
        let task = tokio::spawn(run_execution(id.clone(), request, sink, cancel.clone(), state_tx));

        ExecutionHandle::new(id, cancel, state_rx, task)
    }

    /// List model ids offered by the orchestrator
    ///
    /// Failures are logged and produce an empty list.
    pub async fn list_models(&self) -> Vec<String> {
        let url = self.url("models");
        debug!(%url, "list_models: called");

        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "list_models: request failed");
                return Vec::new();
            }
        };

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "list_models: API error");
            return Vec::new();
        }

        match response.json::<ModelList>().await {
            Ok(list) => list.data.into_iter().map(|m| m.id).collect(),
            Err(e) => {
                warn!(error = %e, "list_models: invalid response");
                Vec::new()
            }
        }
    }
}

fn parse_plan_reply(envelope: CompletionEnvelope) -> Result<PlanReply, ClientError> {
    let plan_field = plan_field(envelope.plan_json);
    if envelope.choices.is_empty() && plan_field.is_none() {
        return Err(ClientError::InvalidResponse(
            "completion has no choices and no plan_json".to_string(),
        ));
    }

    let text = envelope
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .unwrap_or_default();

    if let Some(plan_json) = plan_field {
        debug!("parse_plan_reply: using plan_json field");
        return Ok(PlanReply {
            text,
            plan_json: Some(plan_json),
            source: PlanSource::ResponseField,
        });
    }

    let (plan_json, method) = plan_from_text(&text);
    debug!(?method, "parse_plan_reply: extracted from text");
    Ok(PlanReply {
        text,
        plan_json,
        source: PlanSource::Text(method),
    })
}

/// Recover a plan-shaped value from assistant text
///
/// A marker or prefix payload is kept only when it is an object or array;
/// a scalar there falls back to the first balanced object in the text.
fn plan_from_text(text: &str) -> (Option<Value>, ExtractionMethod) {
    let payload = extract_payload(text);
    match payload.value {
        Some(value) if value.is_object() || value.is_array() => (Some(value), payload.method),
        Some(scalar) => {
            debug!(method = ?payload.method, %scalar, "plan_from_text: payload is not a plan shape");
            match extract_first_json(text) {
                Some(value) => (Some(value), ExtractionMethod::BalancedObject),
                None => (None, ExtractionMethod::None),
            }
        }
        None => (None, payload.method),
    }
}

/// Normalize the `plan_json` field; some orchestrators send it as a JSON string
fn plan_field(value: Option<Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::String(s) => match serde_json::from_str(&s) {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(error = %e, "plan_field: string plan_json is not JSON");
                None
            }
        },
        other => Some(other),
    }
}

async fn run_execution(
    id: String,
    request: RequestBuilder,
    sink: mpsc::Sender<StreamEvent>,
    cancel: CancellationToken,
    state: watch::Sender<ExecutionState>,
) -> ExecutionState {
    state.send_replace(ExecutionState::Requesting);
    info!(%id, "run_execution: requesting plan execution");

    let terminal = execute(&id, request, &sink, &cancel, &state).await;
    let final_state = ExecutionState::from(&terminal);
    state.send_replace(final_state);

    match &terminal {
        Terminal::Error(message) => warn!(%id, %message, "run_execution: errored"),
        _ => info!(%id, %final_state, "run_execution: done"),
    }
    final_state
}

async fn execute(
    id: &str,
    request: RequestBuilder,
    sink: &mpsc::Sender<StreamEvent>,
    cancel: &CancellationToken,
    state: &watch::Sender<ExecutionState>,
) -> Terminal {
    let sent = tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        sent = request.send() => Some(sent),
    };

    let terminal = match sent {
        None => {
            debug!(%id, "execute: cancelled before response");
            Terminal::Cancelled
        }
        Some(Err(e)) => Terminal::Error(format!("Request failed: {}", e)),
        Some(Ok(response)) if !response.status().is_success() => {
            let status = response.status().as_u16();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => Terminal::Cancelled,
                text = response.text() => Terminal::Error(format!(
                    "API error {}: {}",
                    status,
                    text.unwrap_or_default()
                )),
            }
        }
        Some(Ok(response)) => {
            state.send_replace(ExecutionState::Streaming);
            debug!(%id, "execute: streaming");
            return pump(response.bytes_stream(), sink, cancel).await;
        }
    };

    send_terminal(sink, &terminal).await;
    terminal
}

// Orchestrator response types

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    plan_json: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<CompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
