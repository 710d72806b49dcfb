//! Plan execution client
//!
//! Submits prompts for planning and rendered plans for streaming execution.

mod error;
mod handle;
mod orchestrator;

pub use error::ClientError;
pub use handle::{ExecutionHandle, ExecutionState};
pub use orchestrator::{OrchestratorClient, PlanReply, PlanSource};
