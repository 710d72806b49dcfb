//! Structured-data extraction from loosely formatted assistant text
//!
//! Assistant replies mix prose with JSON. This module recovers the JSON:
//! - [`extract_first_json`] - first balanced `{...}` object, parsed
//! - [`extract_payload`] - marker, legacy prefix and balanced-object fallbacks

use serde_json::Value;
use tracing::debug;

mod payload;

pub use payload::{ExtractionMethod, LEGACY_PREFIX, MARKER_END, MARKER_START, Payload, extract_payload};

/// Find the first balanced `{...}` object in `text` and return it as a slice
///
/// Brace counting is suspended inside JSON string literals, so a value such as
/// `"a } b"` does not close the object early. Returns `None` when there is no
/// `{` or the object never closes.
pub fn find_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    debug!(%start, "find_balanced_object: opening brace found");

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    debug!(%start, %end, "find_balanced_object: balanced candidate");
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    debug!(%depth, in_string, "find_balanced_object: unbalanced, no candidate");
    None
}

/// Extract and parse the first balanced JSON object embedded in `text`
///
/// Never fails: a missing, unbalanced or unparsable candidate yields `None`.
pub fn extract_first_json(text: &str) -> Option<Value> {
    debug!(text_len = text.len(), "extract_first_json: called");
    let candidate = find_balanced_object(text)?;

    match serde_json::from_str(candidate) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!(error = %e, "extract_first_json: candidate failed to parse");
            None
        }
    }
}
