//! In-memory integration tests for `executeTool` dispatch.

use super::helpers::{TestContext, ambient, context, profile, scripted_server};
use capability_bridge::bridge::{
    adapters::RecordedCall,
    domain::{AmbientEnvironment, ConnectionProfile, InvocationRequest},
    services::{BridgeError, BridgeOperation, CapabilityBridge, FailureKind, TransportFactory},
};
use rstest::rstest;
use serde_json::{Map, Value, json};

fn execute(name: &str, parameters: Value) -> BridgeOperation {
    BridgeOperation::ExecuteTool(InvocationRequest::new(name, parameters))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

// ── Tools ──────────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tool_call_forwards_arguments_and_returns_the_result(
    context: TestContext,
    profile: ConnectionProfile,
) {
    context
        .server
        .set_tool_result(
            "echo",
            json!({ "content": [{ "type": "text", "text": "hello" }] }),
        )
        .expect("result should be scriptable");

    let payload = context
        .bridge
        .invoke(&profile, execute("echo", json!({ "message": "hello" })))
        .await
        .expect("tool call should succeed");

    assert_eq!(
        payload,
        json!({ "content": [{ "type": "text", "text": "hello" }] })
    );
    assert_eq!(
        context.server.calls().expect("call log"),
        vec![RecordedCall::CallTool {
            name: "echo".to_owned(),
            arguments: object(json!({ "message": "hello" })),
        }]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn json_text_content_is_decoded(context: TestContext, profile: ConnectionProfile) {
    context
        .server
        .set_tool_result(
            "echo",
            json!({ "text": "{\"echoed\":\"hi\"}", "mimeType": "application/json" }),
        )
        .expect("result should be scriptable");

    let payload = context
        .bridge
        .invoke(&profile, execute("echo", json!({ "message": "hi" })))
        .await
        .expect("tool call should succeed");

    assert_eq!(payload, json!({ "echoed": "hi" }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_tool_surfaces_the_server_message(
    context: TestContext,
    profile: ConnectionProfile,
) {
    let err = context
        .bridge
        .invoke(&profile, execute("nope", json!({})))
        .await
        .expect_err("unknown tool should fail");

    assert_eq!(err.kind(), FailureKind::Call);
    assert_eq!(err.to_string(), "failed to execute 'nope': Unknown tool: nope");
    assert_eq!(context.server.close_count().expect("count"), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn malformed_parameter_text_fails_before_any_call(
    context: TestContext,
    profile: ConnectionProfile,
) {
    let operation =
        BridgeOperation::ExecuteTool(InvocationRequest::new("echo", "{not json"));

    let err = context
        .bridge
        .invoke(&profile, operation)
        .await
        .expect_err("malformed parameters should fail");

    assert!(matches!(
        err,
        BridgeError::Validation { capability: Some(ref name), .. } if name == "echo"
    ));
    assert!(context.server.calls().expect("call log").is_empty());
}

// ── Resources and prompts ──────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn resource_call_reads_the_given_uri_and_decodes_json_contents(
    context: TestContext,
    profile: ConnectionProfile,
) {
    context
        .server
        .set_resource_content(
            "file:///etc/app/config.json",
            json!({
                "contents": [{
                    "uri": "file:///etc/app/config.json",
                    "mimeType": "application/json",
                    "text": "{\"debug\":true}"
                }]
            }),
        )
        .expect("content should be scriptable");

    let payload = context
        .bridge
        .invoke(
            &profile,
            execute(
                "resource_config",
                json!({ "uri": "file:///etc/app/config.json" }),
            ),
        )
        .await
        .expect("resource read should succeed");

    assert_eq!(payload, json!({ "debug": true }));
    assert_eq!(
        context.server.calls().expect("call log"),
        vec![RecordedCall::ReadResource {
            uri: "file:///etc/app/config.json".to_owned(),
        }]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn template_call_without_uri_is_rejected_before_any_call(
    context: TestContext,
    profile: ConnectionProfile,
) {
    let err = context
        .bridge
        .invoke(&profile, execute("resource_template_report", json!({})))
        .await
        .expect_err("missing uri should fail");

    assert_eq!(err.kind(), FailureKind::Validation);
    assert_eq!(
        err.to_string(),
        "parameter 'uri' (string) is required for resource template capability \
         'resource_template_report'"
    );
    assert!(context.server.calls().expect("call log").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_resource_carries_a_structured_description(
    context: TestContext,
    profile: ConnectionProfile,
) {
    let err = context
        .bridge
        .invoke(
            &profile,
            execute("resource_config", json!({ "uri": "file:///missing" })),
        )
        .await
        .expect_err("missing resource should fail");

    assert_eq!(err.kind(), FailureKind::Call);
    assert_eq!(err.description(), Some(r#"{"uri":"file:///missing"}"#));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prompt_call_strips_the_prefix(context: TestContext, profile: ConnectionProfile) {
    context
        .server
        .set_prompt_result(
            "greeting",
            json!({ "messages": [{ "role": "user", "content": { "type": "text", "text": "Hi" } }] }),
        )
        .expect("prompt should be scriptable");

    let payload = context
        .bridge
        .invoke(&profile, execute("prompt_greeting", json!({})))
        .await
        .expect("prompt call should succeed");

    assert_eq!(
        payload.pointer("/messages/0/role"),
        Some(&json!("user"))
    );
    assert_eq!(
        context.server.calls().expect("call log"),
        vec![RecordedCall::GetPrompt {
            name: "greeting".to_owned(),
        }]
    );
}

// ── Discovery-backed resolution ────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovered_schema_rejects_missing_required_parameters(
    ambient: AmbientEnvironment,
    profile: ConnectionProfile,
) {
    let server = scripted_server().expect("in-memory server should be scriptable");
    let bridge = CapabilityBridge::new(server.clone(), TransportFactory::new(ambient))
        .with_resolve_via_discovery(true);

    let err = bridge
        .invoke(&profile, execute("echo", json!({ "repeat": 2 })))
        .await
        .expect_err("missing message should fail");

    assert_eq!(err.kind(), FailureKind::Validation);
    assert!(server.calls().expect("call log").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovered_schema_drops_undeclared_arguments(
    ambient: AmbientEnvironment,
    profile: ConnectionProfile,
) {
    let server = scripted_server().expect("in-memory server should be scriptable");
    let bridge = CapabilityBridge::new(server.clone(), TransportFactory::new(ambient))
        .with_resolve_via_discovery(true);

    bridge
        .invoke(
            &profile,
            execute("echo", json!({ "message": "hi", "stray": true })),
        )
        .await
        .expect("tool call should succeed");

    assert_eq!(
        server.calls().expect("call log"),
        vec![RecordedCall::CallTool {
            name: "echo".to_owned(),
            arguments: object(json!({ "message": "hi" })),
        }]
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registered_resource_falls_back_to_its_own_uri(
    ambient: AmbientEnvironment,
    profile: ConnectionProfile,
) {
    let server = scripted_server().expect("in-memory server should be scriptable");
    server
        .set_resource_content(
            "file:///etc/app/config.json",
            json!({ "contents": [{ "uri": "file:///etc/app/config.json", "text": "plain" }] }),
        )
        .expect("content should be scriptable");
    let bridge = CapabilityBridge::new(server.clone(), TransportFactory::new(ambient))
        .with_resolve_via_discovery(true);

    let payload = bridge
        .invoke(&profile, execute("resource_config", json!({})))
        .await
        .expect("resource read should succeed");

    assert_eq!(
        payload.pointer("/contents/0/text"),
        Some(&json!("plain"))
    );
    assert_eq!(
        server.calls().expect("call log"),
        vec![RecordedCall::ReadResource {
            uri: "file:///etc/app/config.json".to_owned(),
        }]
    );
}
