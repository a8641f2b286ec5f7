//! Capability kinds and the public naming convention.

use super::ParseCapabilityKindError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of capability exposed by an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityKind {
    /// Invocable tool.
    Tool,
    /// Readable resource with a fixed URI.
    Resource,
    /// Prompt template.
    Prompt,
    /// Resource addressed through a URI template.
    ResourceTemplate,
}

/// Prefixed kinds in resolution order.
///
/// `resource_template_` shares its head with `resource_`, so it is tested
/// first.
const PREFIXED_KINDS: [CapabilityKind; 3] = [
    CapabilityKind::ResourceTemplate,
    CapabilityKind::Resource,
    CapabilityKind::Prompt,
];

impl CapabilityKind {
    /// All kinds in discovery order.
    pub const DISCOVERY_ORDER: [Self; 4] = [
        Self::Tool,
        Self::Resource,
        Self::Prompt,
        Self::ResourceTemplate,
    ];

    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Resource => "resource",
            Self::Prompt => "prompt",
            Self::ResourceTemplate => "resource_template",
        }
    }

    /// Returns the public-name prefix for this kind.
    ///
    /// Tools keep their original name and have an empty prefix.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Tool => "",
            Self::Resource => "resource_",
            Self::Prompt => "prompt_",
            Self::ResourceTemplate => "resource_template_",
        }
    }

    /// Builds the public name for an original identifier of this kind.
    #[must_use]
    pub fn public_name(self, original: &str) -> String {
        format!("{}{original}", self.prefix())
    }

    /// Returns whether calls of this kind read a resource by URI.
    #[must_use]
    pub const fn reads_resource(self) -> bool {
        matches!(self, Self::Resource | Self::ResourceTemplate)
    }

    /// Derives the kind and original identifier from a public name.
    ///
    /// Names without a recognised prefix resolve to [`Self::Tool`] with the
    /// full name as identifier.
    #[must_use]
    pub fn from_public_name(public_name: &str) -> (Self, &str) {
        PREFIXED_KINDS
            .iter()
            .find_map(|kind| {
                public_name
                    .strip_prefix(kind.prefix())
                    .map(|identifier| (*kind, identifier))
            })
            .unwrap_or((Self::Tool, public_name))
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for CapabilityKind {
    type Error = ParseCapabilityKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "tool" => Ok(Self::Tool),
            "resource" => Ok(Self::Resource),
            "prompt" => Ok(Self::Prompt),
            "resource_template" => Ok(Self::ResourceTemplate),
            _ => Err(ParseCapabilityKindError(value.to_owned())),
        }
    }
}
