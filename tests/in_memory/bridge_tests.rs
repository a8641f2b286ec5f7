//! In-memory integration tests for host operations and connection scoping.

use super::helpers::{TestContext, context, profile};
use capability_bridge::bridge::{
    config::{BridgeConfig, OperationParameters},
    domain::{CapabilityKind, ChannelTarget, ConnectionProfile, ToolListing},
    services::{BridgeOperation, CapabilityBridge, FailureKind},
};
use rstest::rstest;
use serde_json::json;
use std::collections::BTreeMap;

// ── Listing operations ─────────────────────────────────────────────

#[rstest]
#[case(BridgeOperation::ListTools, "/tools/0/name", "echo")]
#[case(
    BridgeOperation::ListResources,
    "/resources/0/uri",
    "file:///etc/app/config.json"
)]
#[case(
    BridgeOperation::ListResourceTemplates,
    "/resourceTemplates/0/uriTemplate",
    "reports://{year}/{id}"
)]
#[case(BridgeOperation::ListPrompts, "/prompts/0/name", "greeting")]
#[tokio::test(flavor = "multi_thread")]
async fn list_operations_wrap_the_raw_listing(
    context: TestContext,
    profile: ConnectionProfile,
    #[case] operation: BridgeOperation,
    #[case] pointer: &str,
    #[case] expected: &str,
) {
    let payload = context
        .bridge
        .invoke(&profile, operation)
        .await
        .expect("listing should succeed");

    assert_eq!(payload.pointer(pointer), Some(&json!(expected)));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_tools_passes_unmodelled_fields_through(
    context: TestContext,
    profile: ConnectionProfile,
) {
    let mut listing = ToolListing::new("echo", json!({ "type": "object" }));
    listing.extra.insert("title".to_owned(), json!("Echo"));
    listing
        .extra
        .insert("annotations".to_owned(), json!({ "readOnlyHint": true }));
    context
        .server
        .set_tools(vec![listing])
        .expect("tools should be scriptable");

    let payload = context
        .bridge
        .invoke(&profile, BridgeOperation::ListTools)
        .await
        .expect("listing should succeed");

    assert_eq!(payload.pointer("/tools/0/title"), Some(&json!("Echo")));
    assert_eq!(
        payload.pointer("/tools/0/annotations/readOnlyHint"),
        Some(&json!(true))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_listing_is_a_call_error(context: TestContext, profile: ConnectionProfile) {
    context
        .server
        .fail_listing(CapabilityKind::Prompt, "prompts disabled")
        .expect("failure should be scriptable");

    let err = context
        .bridge
        .invoke(&profile, BridgeOperation::ListPrompts)
        .await
        .expect_err("listing should fail");

    assert_eq!(err.kind(), FailureKind::Call);
    assert_eq!(
        err.to_string(),
        "failed to execute 'listPrompts': prompts disabled"
    );
}

// ── Direct resource and prompt access ──────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn read_resource_normalises_the_content(context: TestContext, profile: ConnectionProfile) {
    context
        .server
        .set_resource_content(
            "file:///etc/app/config.json",
            json!({
                "contents": [{
                    "mimeType": "application/json",
                    "text": "{\"level\":3}"
                }]
            }),
        )
        .expect("content should be scriptable");

    let payload = context
        .bridge
        .invoke(
            &profile,
            BridgeOperation::ReadResource {
                uri: "file:///etc/app/config.json".to_owned(),
            },
        )
        .await
        .expect("read should succeed");

    assert_eq!(payload, json!({ "level": 3 }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_prompt_returns_the_raw_result(context: TestContext, profile: ConnectionProfile) {
    let prompt = json!({ "description": "Say hi", "messages": [] });
    context
        .server
        .set_prompt_result("greeting", prompt.clone())
        .expect("prompt should be scriptable");

    let payload = context
        .bridge
        .invoke(
            &profile,
            BridgeOperation::GetPrompt {
                name: "greeting".to_owned(),
            },
        )
        .await
        .expect("prompt should be returned");

    assert_eq!(payload, prompt);
}

// ── Connection scope ───────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn connect_failure_is_reported_and_the_client_closed(
    context: TestContext,
    profile: ConnectionProfile,
) {
    context
        .server
        .fail_connect("spawn failed")
        .expect("failure should be scriptable");

    let err = context
        .bridge
        .invoke(&profile, BridgeOperation::ListTools)
        .await
        .expect_err("connection should fail");

    assert_eq!(err.kind(), FailureKind::Connection);
    assert_eq!(
        err.to_string(),
        "failed to connect to MCP server: transport error: spawn failed"
    );
    assert_eq!(context.server.close_count().expect("count"), 1);
    assert!(context.server.calls().expect("call log").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn close_failure_does_not_mask_the_result(context: TestContext, profile: ConnectionProfile) {
    context
        .server
        .fail_close("pipe already closed")
        .expect("failure should be scriptable");

    let payload = context
        .bridge
        .invoke(&profile, BridgeOperation::ListPrompts)
        .await
        .expect("close failure should be swallowed");

    assert_eq!(payload.pointer("/prompts/0/name"), Some(&json!("greeting")));
    assert_eq!(context.server.close_count().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_invocation_uses_a_fresh_connection(
    context: TestContext,
    profile: ConnectionProfile,
) {
    for _ in 0..3 {
        context
            .bridge
            .invoke(&profile, BridgeOperation::ListTools)
            .await
            .expect("listing should succeed");
    }

    assert_eq!(context.server.connect_count().expect("count"), 3);
    assert_eq!(context.server.close_count().expect("count"), 3);
    assert!(!context.server.is_connected());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn process_channel_carries_merged_environment(
    context: TestContext,
    profile: ConnectionProfile,
) {
    context
        .bridge
        .invoke(&profile, BridgeOperation::ListTools)
        .await
        .expect("listing should succeed");

    let channels = context.server.channels().expect("channel log");
    let [ChannelTarget::Process(process)] = channels.as_slice() else {
        panic!("expected one process channel, got {channels:?}");
    };
    let expected: BTreeMap<String, String> = [
        ("FOO", "bar"),
        ("PATH", "/usr/local/bin:/usr/bin"),
        ("TOKEN", "secret"),
    ]
    .into_iter()
    .map(|(name, value)| (name.to_owned(), value.to_owned()))
    .collect();
    assert_eq!(process.command, "echo");
    assert_eq!(process.env, expected);
}

// ── Host flow ──────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn host_settings_and_parameters_drive_one_invocation() {
    let server = super::helpers::scripted_server().expect("in-memory server should be scriptable");
    server
        .set_tool_result("echo", json!({ "content": [] }))
        .expect("result should be scriptable");
    let config: BridgeConfig = serde_json::from_value(json!({
        "connectionType": "cmd",
        "process": { "command": "echo-server", "args": "--stdio" },
        "resolveViaDiscovery": true
    }))
    .expect("settings should parse");
    let parameters: OperationParameters = serde_json::from_value(json!({
        "toolName": "echo",
        "toolParameters": "{\"message\":\"hi\",\"repeat\":2}"
    }))
    .expect("parameters should parse");

    let profile = config.connection_profile().expect("profile should build");
    let operation =
        BridgeOperation::from_host("executeTool", parameters).expect("operation should parse");
    let bridge = CapabilityBridge::from_config(server.clone(), &config);

    let payload = bridge
        .invoke(&profile, operation)
        .await
        .expect("invocation should succeed");

    assert_eq!(payload, json!({ "content": [] }));
    let channels = server.channels().expect("channel log");
    let [ChannelTarget::Process(process)] = channels.as_slice() else {
        panic!("expected one process channel, got {channels:?}");
    };
    assert_eq!(process.command, "echo-server");
    assert_eq!(process.args, ["--stdio"]);
}

#[rstest]
#[case("subscribe")]
#[case("")]
fn unknown_host_operations_are_unsupported(#[case] name: &str) {
    let err = BridgeOperation::from_host(name, OperationParameters::default())
        .expect_err("operation should be rejected");

    assert_eq!(err.kind(), FailureKind::UnsupportedOperation);
}
