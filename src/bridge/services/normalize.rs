//! Best-effort normalisation of raw protocol results.

use crate::bridge::domain::{InvocationResult, JSON_MIME_TYPE};
use serde_json::Value;
use tracing::{debug, warn};

/// Normalises a raw result into a single JSON object.
///
/// Text marked `application/json`, either at the top level or in the first
/// element of `contents`, is decoded. Decoding failures keep the raw result.
/// Anything that does not end up as an object is wrapped under
/// [`crate::bridge::domain::RAW_RESULT_FIELD`].
#[must_use]
pub fn normalize_result(capability: &str, raw: Value) -> InvocationResult {
    match decode_embedded_json(capability, &raw) {
        Some(Value::Object(decoded)) => InvocationResult::new(decoded, raw),
        Some(_) => {
            warn!(capability, "decoded JSON content is not an object; returning raw result");
            InvocationResult::fallback(raw)
        }
        None => match raw {
            Value::Object(map) => {
                let raw_copy = Value::Object(map.clone());
                InvocationResult::new(map, raw_copy)
            }
            other => {
                warn!(capability, "result is not a standard object; returning raw result");
                InvocationResult::fallback(other)
            }
        },
    }
}

fn decode_embedded_json(capability: &str, raw: &Value) -> Option<Value> {
    if let Some(text) = json_text(raw) {
        return parse_logged(capability, text, "text content");
    }
    let first = raw.get("contents")?.as_array()?.first()?;
    json_text(first).and_then(|text| parse_logged(capability, text, "first content"))
}

fn json_text(content: &Value) -> Option<&str> {
    let text = content.get("text")?.as_str()?;
    let is_json = content
        .get("mimeType")
        .and_then(Value::as_str)
        .is_some_and(|mime_type| mime_type == JSON_MIME_TYPE);
    is_json.then_some(text)
}

fn parse_logged(capability: &str, text: &str, location: &str) -> Option<Value> {
    match serde_json::from_str(text) {
        Ok(decoded) => {
            debug!(capability, location, "parsed JSON from result content");
            Some(decoded)
        }
        Err(err) => {
            warn!(capability, location, error = %err, "failed to parse JSON from result content; returning raw result");
            None
        }
    }
}
