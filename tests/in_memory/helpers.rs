//! Shared test helpers for in-memory bridge integration tests.

use capability_bridge::bridge::{
    adapters::InMemoryProtocolClient,
    domain::{
        AmbientEnvironment, ConnectionProfile, DEFAULT_AMBIENT_PREFIX, ProcessProfile,
        PromptListing, ResourceListing, ResourceTemplateListing, ToolListing,
    },
    services::{CapabilityBridge, TransportFactory},
};
use rstest::fixture;
use serde_json::json;

/// Bridge backed by the in-memory server.
pub type TestBridge = CapabilityBridge<InMemoryProtocolClient>;

/// Scripted server together with a bridge that talks to it.
pub struct TestContext {
    /// Scripted server shared by every client the bridge creates.
    pub server: InMemoryProtocolClient,
    /// Bridge under test.
    pub bridge: TestBridge,
}

/// Ambient environment with an inherited `PATH` and one forwarded token.
#[fixture]
pub fn ambient() -> AmbientEnvironment {
    AmbientEnvironment::from_vars(
        [
            ("PATH", "/usr/local/bin:/usr/bin"),
            ("MCP_TOKEN", "secret"),
            ("HOME", "/home/tester"),
        ]
        .map(|(name, value)| (name.to_owned(), value.to_owned())),
        DEFAULT_AMBIENT_PREFIX,
    )
}

/// Process profile used by every scenario.
///
/// # Panics
///
/// Panics if the fixed command is rejected.
#[fixture]
pub fn profile() -> ConnectionProfile {
    ConnectionProfile::Process(
        ProcessProfile::new("echo")
            .expect("fixed command is valid")
            .with_env_pairs("FOO=bar"),
    )
}

/// Server exposing one capability of each kind.
///
/// # Errors
///
/// Returns an error if the in-memory state cannot be scripted.
pub fn scripted_server() -> eyre::Result<InMemoryProtocolClient> {
    let server = InMemoryProtocolClient::new();
    server.set_tools(vec![
        ToolListing::new(
            "echo",
            json!({
                "type": "object",
                "properties": {
                    "message": { "type": "string", "description": "Text to echo" },
                    "repeat": { "type": "integer" }
                },
                "required": ["message"]
            }),
        )
        .with_description("Echoes the message back"),
    ])?;
    server.set_resources(vec![ResourceListing::new(
        "config",
        "file:///etc/app/config.json",
    )])?;
    server.set_prompts(vec![PromptListing::new("greeting")])?;
    server.set_resource_templates(vec![ResourceTemplateListing::new(
        "report",
        "reports://{year}/{id}",
    )])?;
    Ok(server)
}

/// Scripted server plus a convention-only bridge.
///
/// # Panics
///
/// Panics if the in-memory state cannot be scripted.
#[fixture]
pub fn context(ambient: AmbientEnvironment) -> TestContext {
    let server = scripted_server().expect("in-memory server should be scriptable");
    let bridge = CapabilityBridge::new(server.clone(), TransportFactory::new(ambient));
    TestContext { server, bridge }
}
