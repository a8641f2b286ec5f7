//! In-memory integration tests for capability discovery.

use super::helpers::{TestContext, context, profile};
use capability_bridge::bridge::{
    domain::{CapabilityDescriptor, CapabilityKind, ConnectionProfile},
    services::BridgeOperation,
};
use rstest::rstest;
use serde_json::{Value, json};

fn descriptors(payload: Value) -> eyre::Result<Vec<CapabilityDescriptor>> {
    let tools = payload
        .get("tools")
        .cloned()
        .ok_or_else(|| eyre::eyre!("discovery payload has no tools field"))?;
    Ok(serde_json::from_value(tools)?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_exposes_every_kind_under_public_names(
    context: TestContext,
    profile: ConnectionProfile,
) {
    let payload = context
        .bridge
        .invoke(&profile, BridgeOperation::DiscoverCapabilities)
        .await
        .expect("discovery should succeed");

    let found = descriptors(payload).expect("descriptors should decode");
    let names: Vec<&str> = found.iter().map(|descriptor| descriptor.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "echo",
            "resource_config",
            "prompt_greeting",
            "resource_template_report"
        ]
    );
    let kinds: Vec<CapabilityKind> = found
        .iter()
        .map(|descriptor| descriptor.metadata.kind)
        .collect();
    assert_eq!(kinds, CapabilityKind::DISCOVERY_ORDER);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tool_descriptor_carries_coerced_schema(context: TestContext, profile: ConnectionProfile) {
    let payload = context
        .bridge
        .invoke(&profile, BridgeOperation::DiscoverCapabilities)
        .await
        .expect("discovery should succeed");

    let found = descriptors(payload).expect("descriptors should decode");
    let echo = found
        .iter()
        .find(|descriptor| descriptor.name == "echo")
        .expect("echo should be discovered");
    assert_eq!(echo.description, "Echoes the message back");
    assert_eq!(
        echo.json_schema.pointer("/properties/message"),
        Some(&json!({ "type": "string", "description": "Text to echo" }))
    );
    assert_eq!(
        echo.json_schema.pointer("/required"),
        Some(&json!(["message"]))
    );
    assert_eq!(
        echo.json_schema.pointer("/additionalProperties"),
        Some(&json!(false))
    );
}

#[rstest]
#[case(CapabilityKind::Tool)]
#[case(CapabilityKind::Resource)]
#[case(CapabilityKind::Prompt)]
#[case(CapabilityKind::ResourceTemplate)]
#[tokio::test(flavor = "multi_thread")]
async fn one_failing_listing_leaves_the_other_kinds_intact(
    context: TestContext,
    profile: ConnectionProfile,
    #[case] failing: CapabilityKind,
) {
    context
        .server
        .fail_listing(failing, "listing unavailable")
        .expect("failure should be scriptable");

    let payload = context
        .bridge
        .invoke(&profile, BridgeOperation::DiscoverCapabilities)
        .await
        .expect("discovery should tolerate one failing kind");

    let found = descriptors(payload).expect("descriptors should decode");
    for kind in CapabilityKind::DISCOVERY_ORDER {
        let count = found
            .iter()
            .filter(|descriptor| descriptor.metadata.kind == kind)
            .count();
        let expected = usize::from(kind != failing);
        assert_eq!(count, expected, "unexpected {kind} count");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_opens_and_closes_one_connection(
    context: TestContext,
    profile: ConnectionProfile,
) {
    context
        .bridge
        .invoke(&profile, BridgeOperation::DiscoverCapabilities)
        .await
        .expect("discovery should succeed");

    assert_eq!(context.server.connect_count().expect("count"), 1);
    assert_eq!(context.server.close_count().expect("count"), 1);
}
