//! Orchestrator client error types

use thiserror::Error;

/// Errors from non-streaming orchestrator requests
///
/// Streaming executions never return these; their failures arrive as terminal
/// `error` events instead.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ClientError::ApiError {
            status: 503,
            message: "orchestrator down".to_string(),
        };
        assert_eq!(err.to_string(), "API error 503: orchestrator down");
        assert_eq!(
            ClientError::InvalidResponse("no choices".into()).to_string(),
            "Invalid response: no choices"
        );
    }

    #[test]
    fn test_json_error_converts() {
        let err: ClientError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, ClientError::Json(_)));
    }
}
