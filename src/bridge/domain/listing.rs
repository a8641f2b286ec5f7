//! Capability listings as reported by an MCP server.
//!
//! Field names follow the wire format so listings round-trip unchanged into
//! the payloads of the list operations. Fields without a typed counterpart,
//! such as `title`, `annotations`, or `_meta`, are kept in `extra`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Tool entry from `tools/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolListing {
    /// Tool name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON Schema describing the tool arguments.
    #[serde(default)]
    pub input_schema: Value,
    /// Wire fields not modelled above, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ToolListing {
    /// Creates a tool listing.
    #[must_use]
    pub fn new(name: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: None,
            input_schema,
            extra: Map::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Resource entry from `resources/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListing {
    /// Resource URI.
    pub uri: String,
    /// Resource name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Wire fields not modelled above, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceListing {
    /// Creates a resource listing.
    #[must_use]
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            name: name.into(),
            description: None,
            mime_type: None,
            extra: Map::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Argument declared by a prompt template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptArgument {
    /// Argument name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the argument must be supplied.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Wire fields not modelled above, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Prompt entry from `prompts/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptListing {
    /// Prompt name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared arguments.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<PromptArgument>,
    /// Wire fields not modelled above, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PromptListing {
    /// Creates a prompt listing without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            arguments: Vec::new(),
            extra: Map::new(),
        }
    }
}

/// Resource template entry from `resources/templates/list`.
///
/// Name and URI template are optional on the wire so that malformed entries
/// can be reported and skipped instead of failing the whole listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceTemplateListing {
    /// Template name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// RFC 6570 URI template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uri_template: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Optional MIME type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    /// Wire fields not modelled above, passed through unchanged.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ResourceTemplateListing {
    /// Creates a complete template listing.
    #[must_use]
    pub fn new(name: impl Into<String>, uri_template: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            uri_template: Some(uri_template.into()),
            description: None,
            mime_type: None,
            extra: Map::new(),
        }
    }
}
