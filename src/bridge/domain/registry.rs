//! Ordered registry of capabilities discovered in one session.

use super::{Capability, CapabilityDescriptor, CapabilityKind};

/// Capabilities keyed by public name, in discovery order.
///
/// The registry does not detect public-name collisions across kinds; lookups
/// return the first entry registered under a name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CapabilityRegistry {
    entries: Vec<Capability>,
}

impl CapabilityRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Appends a capability.
    pub fn register(&mut self, capability: Capability) {
        self.entries.push(capability);
    }

    /// Finds a capability by public name.
    #[must_use]
    pub fn get(&self, public_name: &str) -> Option<&Capability> {
        self.entries
            .iter()
            .find(|capability| capability.public_name() == public_name)
    }

    /// Resolves a public name to its dispatch target.
    ///
    /// Registered entries carry their own kind tag. Names that were not
    /// discovered fall back to the prefix naming convention.
    #[must_use]
    pub fn resolve<'a>(&'a self, public_name: &'a str) -> Resolution<'a> {
        self.get(public_name).map_or_else(
            || {
                let (kind, identifier) = CapabilityKind::from_public_name(public_name);
                Resolution::ByConvention { kind, identifier }
            },
            Resolution::Registered,
        )
    }

    /// Iterates capabilities in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &Capability> {
        self.entries.iter()
    }

    /// Returns the number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Counts capabilities of one kind.
    #[must_use]
    pub fn count_of(&self, kind: CapabilityKind) -> usize {
        self.entries
            .iter()
            .filter(|capability| capability.kind() == kind)
            .count()
    }

    /// Renders host-facing descriptors in discovery order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<CapabilityDescriptor> {
        self.entries.iter().map(Capability::descriptor).collect()
    }
}

/// Dispatch target for a public name.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Resolution<'a> {
    /// Capability discovered in this session.
    Registered(&'a Capability),
    /// Undiscovered name resolved through the naming convention.
    ByConvention {
        /// Kind derived from the name prefix.
        kind: CapabilityKind,
        /// Name with the prefix removed.
        identifier: &'a str,
    },
}

impl Resolution<'_> {
    /// Returns the resolved kind.
    #[must_use]
    pub const fn kind(&self) -> CapabilityKind {
        match self {
            Self::Registered(capability) => capability.kind(),
            Self::ByConvention { kind, .. } => *kind,
        }
    }

    /// Returns the identifier used by the server.
    #[must_use]
    pub fn identifier(&self) -> &str {
        match self {
            Self::Registered(capability) => capability.original_identifier(),
            Self::ByConvention { identifier, .. } => identifier,
        }
    }
}
