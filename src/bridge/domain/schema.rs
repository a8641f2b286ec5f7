//! Parameter schemas coerced from loosely-typed MCP input schemas.
//!
//! Coercion is intentionally shallow: nested object shapes, enums, and array
//! element types collapse to "any".

use super::ParameterValidationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// JSON Schema dialect advertised by [`ParameterSchema::to_json_schema`].
pub const JSON_SCHEMA_DIALECT: &str = "http://json-schema.org/draft-07/schema#";

/// Value kind accepted by a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    /// UTF-8 string.
    String,
    /// Any JSON number.
    Number,
    /// Whole JSON number.
    Integer,
    /// Boolean.
    Boolean,
    /// Array with unconstrained elements.
    Array,
    /// Object with string keys and unconstrained values.
    Object,
    /// Anything; no validation.
    Any,
}

impl ParameterKind {
    /// Maps a JSON Schema `type` value to a parameter kind.
    ///
    /// Missing, non-string, or unrecognised types map to [`Self::Any`].
    #[must_use]
    pub fn from_schema_type(value: Option<&Value>) -> Self {
        match value.and_then(Value::as_str) {
            Some("string") => Self::String,
            Some("number") => Self::Number,
            Some("integer") => Self::Integer,
            Some("boolean") => Self::Boolean,
            Some("array") => Self::Array,
            Some("object") => Self::Object,
            _ => Self::Any,
        }
    }

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
            Self::Any => "any",
        }
    }

    /// Returns whether `value` is acceptable for this kind.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Integer => is_whole_number(value),
            Self::Boolean => value.is_boolean(),
            Self::Array => value.is_array(),
            Self::Object => value.is_object(),
            Self::Any => true,
        }
    }

    fn json_schema(self) -> Map<String, Value> {
        let rendered = match self {
            Self::String => json!({ "type": "string" }),
            Self::Number => json!({ "type": "number" }),
            Self::Integer => json!({ "type": "integer" }),
            Self::Boolean => json!({ "type": "boolean" }),
            Self::Array => json!({ "type": "array", "items": {} }),
            Self::Object => json!({ "type": "object", "additionalProperties": {} }),
            Self::Any => json!({}),
        };
        match rendered {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

fn is_whole_number(value: &Value) -> bool {
    if value.is_i64() || value.is_u64() {
        return true;
    }
    value
        .as_f64()
        .is_some_and(|number| number.is_finite() && number.fract().abs() < f64::EPSILON)
}

/// Declaration of a single parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    kind: ParameterKind,
    optional: bool,
    description: Option<String>,
    default: Option<Value>,
}

impl ParameterSpec {
    /// Creates a required parameter of the given kind.
    #[must_use]
    pub const fn required(kind: ParameterKind) -> Self {
        Self {
            kind,
            optional: false,
            description: None,
            default: None,
        }
    }

    /// Creates an optional parameter of the given kind.
    #[must_use]
    pub const fn optional(kind: ParameterKind) -> Self {
        Self {
            kind,
            optional: true,
            description: None,
            default: None,
        }
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the value used when the parameter is absent.
    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Returns the parameter kind.
    #[must_use]
    pub const fn kind(&self) -> ParameterKind {
        self.kind
    }

    /// Returns whether the parameter may be absent.
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the default value.
    #[must_use]
    pub const fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    fn json_schema(&self) -> Value {
        let mut property = self.kind.json_schema();
        if let Some(description) = &self.description {
            property.insert("description".to_owned(), Value::String(description.clone()));
        }
        if let Some(default) = &self.default {
            property.insert("default".to_owned(), default.clone());
        }
        Value::Object(property)
    }
}

/// Mapping from parameter name to its declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSchema {
    parameters: BTreeMap<String, ParameterSpec>,
}

impl ParameterSchema {
    /// Creates a schema without parameters.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            parameters: BTreeMap::new(),
        }
    }

    /// Coerces an MCP input schema into a parameter schema.
    ///
    /// Every key under `properties` yields exactly one parameter, optional
    /// unless listed in `required`. A schema without `properties` yields an
    /// empty parameter schema.
    #[must_use]
    pub fn from_input_schema(input_schema: &Value) -> Self {
        let Some(properties) = input_schema.get("properties").and_then(Value::as_object) else {
            return Self::empty();
        };

        let required: BTreeSet<&str> = input_schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();

        let parameters = properties
            .iter()
            .map(|(name, property)| {
                let kind = ParameterKind::from_schema_type(property.get("type"));
                let base = if required.contains(name.as_str()) {
                    ParameterSpec::required(kind)
                } else {
                    ParameterSpec::optional(kind)
                };
                let spec = match property
                    .get("description")
                    .and_then(Value::as_str)
                    .filter(|text| !text.is_empty())
                {
                    Some(description) => base.with_description(description),
                    None => base,
                };
                (name.clone(), spec)
            })
            .collect();

        Self { parameters }
    }

    /// Adds or replaces a parameter declaration.
    #[must_use]
    pub fn with_parameter(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }

    /// Returns the declaration for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.get(name)
    }

    /// Iterates declarations in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParameterSpec)> {
        self.parameters
            .iter()
            .map(|(name, spec)| (name.as_str(), spec))
    }

    /// Returns the number of declared parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns whether no parameters are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Validates arguments against the declared parameters.
    ///
    /// Absent optional parameters with a default receive it. Undeclared keys
    /// are dropped from the returned object.
    ///
    /// # Errors
    ///
    /// Returns [`ParameterValidationError`] when a required parameter is
    /// absent or a value does not match its declared kind.
    pub fn validate(
        &self,
        arguments: &Map<String, Value>,
    ) -> Result<Map<String, Value>, ParameterValidationError> {
        let mut validated = Map::new();
        for (name, spec) in &self.parameters {
            match arguments.get(name) {
                Some(value) => {
                    if !spec.kind.accepts(value) {
                        return Err(ParameterValidationError::TypeMismatch {
                            name: name.clone(),
                            expected: spec.kind,
                        });
                    }
                    validated.insert(name.clone(), value.clone());
                }
                None => {
                    if let Some(default) = &spec.default {
                        validated.insert(name.clone(), default.clone());
                    } else if !spec.optional {
                        return Err(ParameterValidationError::MissingRequired(name.clone()));
                    }
                }
            }
        }
        Ok(validated)
    }

    /// Renders the schema as a draft-07 JSON Schema object.
    #[must_use]
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .parameters
            .iter()
            .map(|(name, spec)| (name.clone(), spec.json_schema()))
            .collect();
        let required: Vec<Value> = self
            .parameters
            .iter()
            .filter(|(_, spec)| !spec.optional)
            .map(|(name, _)| Value::String(name.clone()))
            .collect();

        let mut schema = Map::new();
        schema.insert("type".to_owned(), Value::String("object".to_owned()));
        schema.insert("properties".to_owned(), Value::Object(properties));
        if !required.is_empty() {
            schema.insert("required".to_owned(), Value::Array(required));
        }
        schema.insert("additionalProperties".to_owned(), Value::Bool(false));
        schema.insert(
            "$schema".to_owned(),
            Value::String(JSON_SCHEMA_DIALECT.to_owned()),
        );
        Value::Object(schema)
    }
}
