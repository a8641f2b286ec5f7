//! Invocation results.

use serde_json::{Map, Value};

/// MIME type that marks embedded text as JSON.
pub const JSON_MIME_TYPE: &str = "application/json";

/// Field holding the raw result when it cannot be normalised to an object.
pub const RAW_RESULT_FIELD: &str = "rawResult";

/// Outcome of one dispatched invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    normalized: Map<String, Value>,
    raw: Value,
}

impl InvocationResult {
    /// Creates a result from its normalised payload and the raw server
    /// response.
    #[must_use]
    pub const fn new(normalized: Map<String, Value>, raw: Value) -> Self {
        Self { normalized, raw }
    }

    /// Wraps a raw result under [`RAW_RESULT_FIELD`].
    #[must_use]
    pub fn fallback(raw: Value) -> Self {
        let mut normalized = Map::new();
        normalized.insert(RAW_RESULT_FIELD.to_owned(), raw.clone());
        Self { normalized, raw }
    }

    /// Returns the normalised payload.
    #[must_use]
    pub const fn normalized(&self) -> &Map<String, Value> {
        &self.normalized
    }

    /// Returns the raw server response.
    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    /// Consumes the result, returning the normalised payload as a value.
    #[must_use]
    pub fn into_payload(self) -> Value {
        Value::Object(self.normalized)
    }
}
