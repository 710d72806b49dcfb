//! Payload extraction with fallbacks of decreasing reliability

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{extract_first_json, find_balanced_object};

/// Opening marker for an explicitly delimited payload
pub const MARKER_START: &str = "---PAYLOAD_JSON---";

/// Closing marker for an explicitly delimited payload
pub const MARKER_END: &str = "---END_PAYLOAD_JSON---";

/// Prefix used by older action-draft replies
pub const LEGACY_PREFIX: &str = "[ACTION_DRAFT]";

/// Which strategy produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Text between `---PAYLOAD_JSON---` and `---END_PAYLOAD_JSON---`
    Markers,
    /// Text following `[ACTION_DRAFT]`
    LegacyPrefix,
    /// First balanced `{...}` object anywhere in the text
    BalancedObject,
    /// Nothing parsable was found
    None,
}

/// Result of [`extract_payload`]
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub method: ExtractionMethod,
    /// Candidate text of the strategy that succeeded
    pub raw: Option<String>,
    pub value: Option<Value>,
}

impl Payload {
    fn none() -> Self {
        Self {
            method: ExtractionMethod::None,
            raw: None,
            value: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.value.is_some()
    }
}

fn between_markers(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once(MARKER_START)?;
    let (inner, _) = rest.split_once(MARKER_END)?;
    Some(inner.trim())
}

fn after_legacy_prefix(text: &str) -> Option<&str> {
    let (_, rest) = text.split_once(LEGACY_PREFIX)?;
    Some(rest.trim())
}

/// Recover a JSON payload from free-form text
///
/// Strategies are tried in order: explicit markers, the legacy prefix, then
/// the first balanced object. A strategy whose candidate does not parse falls
/// through to the next one.
pub fn extract_payload(text: &str) -> Payload {
    debug!(text_len = text.len(), "extract_payload: called");

    if let Some(candidate) = between_markers(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => {
                debug!("extract_payload: markers matched");
                return Payload {
                    method: ExtractionMethod::Markers,
                    raw: Some(candidate.to_string()),
                    value: Some(value),
                };
            }
            Err(e) => debug!(error = %e, "extract_payload: marker payload failed to parse"),
        }
    }

    if let Some(candidate) = after_legacy_prefix(text) {
        match serde_json::from_str::<Value>(candidate) {
            Ok(value) => {
                debug!("extract_payload: legacy prefix matched");
                return Payload {
                    method: ExtractionMethod::LegacyPrefix,
                    raw: Some(candidate.to_string()),
                    value: Some(value),
                };
            }
            Err(e) => debug!(error = %e, "extract_payload: legacy payload failed to parse"),
        }
    }

    if let Some(value) = extract_first_json(text) {
        debug!("extract_payload: balanced object matched");
        return Payload {
            method: ExtractionMethod::BalancedObject,
            raw: find_balanced_object(text).map(str::to_string),
            value: Some(value),
        };
    }

    debug!("extract_payload: no payload found");
    Payload::none()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_markers_take_precedence() {
        let text = format!(
            "Draft {{\"ignored\": true}}\n{MARKER_START}\n{{\"action\": \"send\"}}\n{MARKER_END}\nthanks"
        );
        let payload = extract_payload(&text);
        assert_eq!(payload.method, ExtractionMethod::Markers);
        assert_eq!(payload.value, Some(json!({"action": "send"})));
        assert_eq!(payload.raw.as_deref(), Some("{\"action\": \"send\"}"));
    }

    #[test]
    fn test_start_marker_alone_falls_back() {
        let text = format!("Sure! {MARKER_START} not applicable here {{\"plan\":[]}} trailing");
        let payload = extract_payload(&text);
        assert_eq!(payload.method, ExtractionMethod::BalancedObject);
        assert_eq!(payload.value, Some(json!({"plan": []})));
    }

    #[test]
    fn test_legacy_prefix() {
        let payload = extract_payload("[ACTION_DRAFT] {\"to\": \"ops\"}");
        assert_eq!(payload.method, ExtractionMethod::LegacyPrefix);
        assert_eq!(payload.value, Some(json!({"to": "ops"})));
    }

    #[test]
    fn test_broken_markers_fall_through_to_balanced_object() {
        let text = format!("{MARKER_START} oops {MARKER_END} but {{\"k\": 1}}");
        let payload = extract_payload(&text);
        assert_eq!(payload.method, ExtractionMethod::BalancedObject);
        assert_eq!(payload.raw.as_deref(), Some("{\"k\": 1}"));
    }

    #[test]
    fn test_nothing_found() {
        let payload = extract_payload("just words");
        assert_eq!(payload, Payload::none());
        assert!(!payload.is_found());
    }
}
