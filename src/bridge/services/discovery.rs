//! Concurrent, partial-failure-tolerant capability discovery.

use crate::bridge::{
    domain::{Capability, CapabilityKind, CapabilityRegistry, ResourceTemplateListing},
    ports::{ProtocolClient, ProtocolResult},
};
use tracing::{debug, info, warn};

/// Lists all four capability kinds concurrently and registers the results.
///
/// The four listings are awaited together. A kind whose listing fails is
/// logged and contributes no capabilities; it never aborts the others.
/// Registration order is tools, resources, prompts, then resource templates.
pub async fn discover_capabilities<C>(client: &C) -> CapabilityRegistry
where
    C: ProtocolClient + ?Sized,
{
    info!("discovering MCP capabilities");
    let (tools, resources, prompts, templates) = tokio::join!(
        client.list_tools(),
        client.list_resources(),
        client.list_prompts(),
        client.list_resource_templates(),
    );

    let mut registry = CapabilityRegistry::new();
    for listing in settled(CapabilityKind::Tool, tools) {
        registry.register(Capability::tool(&listing));
    }
    for listing in settled(CapabilityKind::Resource, resources) {
        registry.register(Capability::resource(&listing));
    }
    for listing in settled(CapabilityKind::Prompt, prompts) {
        registry.register(Capability::prompt(&listing));
    }
    for listing in settled(CapabilityKind::ResourceTemplate, templates) {
        if let Some(capability) = template_capability(&listing) {
            registry.register(capability);
        }
    }

    info!(count = registry.len(), "total capabilities discovered");
    registry
}

fn settled<T>(kind: CapabilityKind, outcome: ProtocolResult<Vec<T>>) -> Vec<T> {
    match outcome {
        Ok(listings) => {
            debug!(kind = %kind, count = listings.len(), "listed capabilities");
            listings
        }
        Err(err) => {
            warn!(kind = %kind, error = %err, "failed to list capabilities");
            Vec::new()
        }
    }
}

fn template_capability(listing: &ResourceTemplateListing) -> Option<Capability> {
    let name = listing.name.as_deref().filter(|value| !value.is_empty());
    let uri_template = listing
        .uri_template
        .as_deref()
        .filter(|value| !value.is_empty());
    match (name, uri_template) {
        (Some(template_name), Some(template)) => Some(Capability::resource_template(
            template_name,
            template,
            listing.description.as_deref(),
        )),
        _ => {
            let rendered = serde_json::to_string(listing).unwrap_or_default();
            warn!(template = %rendered, "skipping invalid resource template item");
            None
        }
    }
}
