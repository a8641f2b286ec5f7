//! Invocation requests and raw host parameters.

use super::ParameterParseError;
use serde::Deserialize;
use serde_json::{Map, Value};

/// Parameters as supplied by the host, before normalisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<Value>")]
pub enum RawParameters {
    /// No parameters supplied.
    #[default]
    Absent,
    /// JSON-encoded text.
    Text(String),
    /// Already-structured value.
    Structured(Value),
}

impl RawParameters {
    /// Normalises the parameters into an argument object.
    ///
    /// Absent values, blank text, `null`, and empty strings or arrays become
    /// an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterParseError::InvalidJson`] when text does not parse
    /// and [`ParameterParseError::NotAnObject`] when the value is a non-empty
    /// array or scalar.
    pub fn into_object(self) -> Result<Map<String, Value>, ParameterParseError> {
        let value = match self {
            Self::Absent => return Ok(Map::new()),
            Self::Text(text) => {
                if text.trim().is_empty() {
                    return Ok(Map::new());
                }
                serde_json::from_str(&text)
                    .map_err(|err| ParameterParseError::InvalidJson(err.to_string()))?
            }
            Self::Structured(value) => value,
        };

        match value {
            Value::Object(map) => Ok(map),
            other if has_content(&other) => Err(ParameterParseError::NotAnObject),
            _ => Ok(Map::new()),
        }
    }
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(_) | Value::Number(_) => true,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

impl From<Option<Value>> for RawParameters {
    fn from(value: Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => Self::Absent,
            Some(Value::String(text)) => Self::Text(text),
            Some(other) => Self::Structured(other),
        }
    }
}

impl From<Value> for RawParameters {
    fn from(value: Value) -> Self {
        Self::from(Some(value))
    }
}

impl From<&str> for RawParameters {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<Map<String, Value>> for RawParameters {
    fn from(value: Map<String, Value>) -> Self {
        Self::Structured(Value::Object(value))
    }
}

/// Request to invoke one capability by public name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Public capability name.
    pub public_name: String,
    /// Raw parameters.
    pub parameters: RawParameters,
}

impl InvocationRequest {
    /// Creates an invocation request.
    #[must_use]
    pub fn new(public_name: impl Into<String>, parameters: impl Into<RawParameters>) -> Self {
        Self {
            public_name: public_name.into(),
            parameters: parameters.into(),
        }
    }
}
