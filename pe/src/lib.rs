//! planexec - streaming plan-execution client
//!
//! Sends prompts to an agent orchestrator for planning, recovers the JSON plan
//! embedded in the assistant's reply, and streams the step-by-step execution of
//! an approved plan back to the caller with mid-stream cancellation.
//!
//! # Modules
//!
//! - [`extract`] - JSON recovery from free-form assistant text
//! - [`plan`] - Plan model, rendering and validation
//! - [`stream`] - Event stream framing and delivery
//! - [`client`] - Orchestrator client and execution handles
//! - [`prompts`] - Planning prompt templates
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod client;
pub mod config;
pub mod extract;
pub mod plan;
pub mod prompts;
pub mod stream;

// Re-export commonly used types
pub use client::{ClientError, ExecutionHandle, ExecutionState, OrchestratorClient, PlanReply, PlanSource};
pub use config::{Config, OrchestratorConfig, ResolvedOrchestratorConfig};
pub use extract::{ExtractionMethod, Payload, extract_first_json, extract_payload};
pub use plan::{Plan, PlanInput, PlanValidationError, Step, render_plan, validate_plan};
pub use stream::{SseFramer, StreamEvent, Terminal};
