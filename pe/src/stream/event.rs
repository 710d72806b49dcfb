//! Events delivered to the caller of a plan execution

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One event from a plan execution stream
///
/// `Data` and `Raw` come from the wire. `Finished`, `Cancelled` and `Error`
/// are lifecycle markers synthesized by the client; exactly one of them ends
/// every execution.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// A `data:` payload that parsed as JSON
    Data { payload: Value },
    /// A `data:` payload that was not valid JSON
    Raw { raw: String },
    /// The stream ended cleanly
    Finished,
    /// The caller cancelled the execution
    Cancelled,
    /// The request or transport failed
    Error { message: String },
}

impl StreamEvent {
    /// Build the event for one `data:` payload
    pub fn from_payload(payload: &str) -> Self {
        match serde_json::from_str(payload) {
            Ok(payload) => Self::Data { payload },
            Err(_) => Self::Raw { raw: payload.to_string() },
        }
    }

    /// Lifecycle markers end a stream; nothing follows them
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Error { .. })
    }
}

/// How an execution ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Terminal {
    Finished,
    Cancelled,
    Error(String),
}

impl Terminal {
    pub fn to_event(&self) -> StreamEvent {
        match self {
            Self::Finished => StreamEvent::Finished,
            Self::Cancelled => StreamEvent::Cancelled,
            Self::Error(message) => StreamEvent::Error {
                message: message.clone(),
            },
        }
    }
}
