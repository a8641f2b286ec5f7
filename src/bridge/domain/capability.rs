//! Capability records built during discovery.

use super::{
    CapabilityKind, ParameterKind, ParameterSchema, ParameterSpec, PromptListing,
    ResourceListing, ToolListing,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the URI parameter used by resource and template capabilities.
pub const URI_PARAMETER: &str = "uri";

/// One invocable unit discovered on an MCP server.
#[derive(Debug, Clone, PartialEq)]
pub struct Capability {
    public_name: String,
    kind: CapabilityKind,
    description: String,
    parameter_schema: ParameterSchema,
    original_identifier: String,
    original_uri: Option<String>,
    original_uri_template: Option<String>,
}

impl Capability {
    /// Builds a tool capability; the public name is the tool name.
    #[must_use]
    pub fn tool(listing: &ToolListing) -> Self {
        let description = non_empty(listing.description.as_deref())
            .map_or_else(|| format!("Execute the {} tool", listing.name), str::to_owned);
        Self {
            public_name: CapabilityKind::Tool.public_name(&listing.name),
            kind: CapabilityKind::Tool,
            description,
            parameter_schema: ParameterSchema::from_input_schema(&listing.input_schema),
            original_identifier: listing.name.clone(),
            original_uri: None,
            original_uri_template: None,
        }
    }

    /// Builds a resource capability with an optional `uri` parameter that
    /// defaults to the resource's own URI.
    #[must_use]
    pub fn resource(listing: &ResourceListing) -> Self {
        let description = non_empty(listing.description.as_deref())
            .map_or_else(|| format!("Read the {} resource", listing.name), str::to_owned);
        let parameter_schema = ParameterSchema::empty().with_parameter(
            URI_PARAMETER,
            ParameterSpec::optional(ParameterKind::String)
                .with_description("URI of the resource to read")
                .with_default(Value::String(listing.uri.clone())),
        );
        Self {
            public_name: CapabilityKind::Resource.public_name(&listing.name),
            kind: CapabilityKind::Resource,
            description,
            parameter_schema,
            original_identifier: listing.name.clone(),
            original_uri: Some(listing.uri.clone()),
            original_uri_template: None,
        }
    }

    /// Builds a prompt capability. Prompt arguments are not modelled.
    #[must_use]
    pub fn prompt(listing: &PromptListing) -> Self {
        let description = non_empty(listing.description.as_deref()).map_or_else(
            || format!("Get the {} prompt template", listing.name),
            str::to_owned,
        );
        Self {
            public_name: CapabilityKind::Prompt.public_name(&listing.name),
            kind: CapabilityKind::Prompt,
            description,
            parameter_schema: ParameterSchema::empty(),
            original_identifier: listing.name.clone(),
            original_uri: None,
            original_uri_template: None,
        }
    }

    /// Builds a resource template capability with a required `uri`.
    #[must_use]
    pub fn resource_template(name: &str, uri_template: &str, description: Option<&str>) -> Self {
        let resolved_description = non_empty(description).map_or_else(
            || format!("Read a resource matching the template URI: {uri_template}"),
            str::to_owned,
        );
        let parameter_schema = ParameterSchema::empty().with_parameter(
            URI_PARAMETER,
            ParameterSpec::required(ParameterKind::String).with_description(format!(
                "URI of the resource to read (must match template: {uri_template})"
            )),
        );
        Self {
            public_name: CapabilityKind::ResourceTemplate.public_name(name),
            kind: CapabilityKind::ResourceTemplate,
            description: resolved_description,
            parameter_schema,
            original_identifier: name.to_owned(),
            original_uri: None,
            original_uri_template: Some(uri_template.to_owned()),
        }
    }

    /// Returns the public name.
    #[must_use]
    pub fn public_name(&self) -> &str {
        &self.public_name
    }

    /// Returns the capability kind.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        self.kind
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the parameter schema.
    #[must_use]
    pub const fn parameter_schema(&self) -> &ParameterSchema {
        &self.parameter_schema
    }

    /// Returns the identifier used by the server.
    #[must_use]
    pub fn original_identifier(&self) -> &str {
        &self.original_identifier
    }

    /// Returns the fixed URI of a resource capability.
    #[must_use]
    pub fn original_uri(&self) -> Option<&str> {
        self.original_uri.as_deref()
    }

    /// Returns the URI template of a resource template capability.
    #[must_use]
    pub fn original_uri_template(&self) -> Option<&str> {
        self.original_uri_template.as_deref()
    }

    /// Renders the host-facing descriptor.
    #[must_use]
    pub fn descriptor(&self) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: self.public_name.clone(),
            description: self.description.clone(),
            json_schema: self.parameter_schema.to_json_schema(),
            metadata: CapabilityMetadata {
                kind: self.kind,
                original_name: self.original_identifier.clone(),
                original_uri: self.original_uri.clone(),
                original_uri_template: self.original_uri_template.clone(),
            },
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}

/// Host-facing description of a discovered capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDescriptor {
    /// Public name.
    pub name: String,
    /// Description.
    pub description: String,
    /// JSON Schema of the parameters.
    pub json_schema: Value,
    /// Origin metadata.
    pub metadata: CapabilityMetadata,
}

/// Origin metadata attached to a [`CapabilityDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityMetadata {
    /// Capability kind.
    pub kind: CapabilityKind,
    /// Identifier used by the server.
    pub original_name: String,
    /// Fixed resource URI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_uri: Option<String>,
    /// Resource URI template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_uri_template: Option<String>,
}
