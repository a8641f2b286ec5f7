//! Unit tests for capability naming, records, and the session registry.

use crate::bridge::domain::{
    Capability, CapabilityKind, CapabilityRegistry, ConnectionState, InvocationResult,
    ParameterParseError, ParseCapabilityKindError, PromptListing, RAW_RESULT_FIELD, RawParameters,
    Resolution, ResourceListing, ResourceTemplateListing, ToolListing, URI_PARAMETER,
};
use rstest::rstest;
use serde_json::{Value, json};

// ── Naming convention ──────────────────────────────────────────────

#[rstest]
#[case(CapabilityKind::Tool, "echo", "echo")]
#[case(CapabilityKind::Resource, "config", "resource_config")]
#[case(CapabilityKind::Prompt, "greeting", "prompt_greeting")]
#[case(CapabilityKind::ResourceTemplate, "report", "resource_template_report")]
fn public_names_carry_the_kind_prefix(
    #[case] kind: CapabilityKind,
    #[case] original: &str,
    #[case] expected: &str,
) {
    assert_eq!(kind.public_name(original), expected);
}

#[rstest]
#[case("resource_template_report", CapabilityKind::ResourceTemplate, "report")]
#[case("resource_config", CapabilityKind::Resource, "config")]
#[case("prompt_greeting", CapabilityKind::Prompt, "greeting")]
#[case("echo", CapabilityKind::Tool, "echo")]
#[case("resource_templates_report", CapabilityKind::Resource, "templates_report")]
fn public_names_resolve_by_longest_prefix_first(
    #[case] public_name: &str,
    #[case] kind: CapabilityKind,
    #[case] identifier: &str,
) {
    assert_eq!(
        CapabilityKind::from_public_name(public_name),
        (kind, identifier)
    );
}

#[rstest]
#[case(CapabilityKind::Tool, "tool")]
#[case(CapabilityKind::Resource, "resource")]
#[case(CapabilityKind::Prompt, "prompt")]
#[case(CapabilityKind::ResourceTemplate, "resource_template")]
fn capability_kind_as_str_round_trip(#[case] kind: CapabilityKind, #[case] expected: &str) {
    assert_eq!(kind.as_str(), expected);
    assert_eq!(
        CapabilityKind::try_from(expected).expect("should parse"),
        kind
    );
}

#[rstest]
#[case(CapabilityKind::Tool, false)]
#[case(CapabilityKind::Resource, true)]
#[case(CapabilityKind::Prompt, false)]
#[case(CapabilityKind::ResourceTemplate, true)]
fn only_resource_kinds_read_by_uri(#[case] kind: CapabilityKind, #[case] expected: bool) {
    assert_eq!(kind.reads_resource(), expected);
}

#[rstest]
fn unknown_capability_kind_is_rejected() {
    let result = CapabilityKind::try_from("sampling");
    assert!(matches!(result, Err(ParseCapabilityKindError(_))));
}

// ── Capability records ─────────────────────────────────────────────

#[rstest]
fn tool_capability_keeps_name_and_default_description() {
    let listing = ToolListing::new("echo", json!({ "type": "object" }));

    let capability = Capability::tool(&listing);

    assert_eq!(capability.public_name(), "echo");
    assert_eq!(capability.kind(), CapabilityKind::Tool);
    assert_eq!(capability.description(), "Execute the echo tool");
    assert_eq!(capability.original_identifier(), "echo");
    assert!(capability.parameter_schema().is_empty());
}

#[rstest]
fn resource_capability_defaults_uri_to_its_own() {
    let listing = ResourceListing::new("config", "file:///etc/app/config.json");

    let capability = Capability::resource(&listing);

    assert_eq!(capability.public_name(), "resource_config");
    assert_eq!(capability.description(), "Read the config resource");
    assert_eq!(capability.original_uri(), Some("file:///etc/app/config.json"));
    let uri = capability
        .parameter_schema()
        .get(URI_PARAMETER)
        .expect("uri parameter should exist");
    assert!(uri.is_optional());
    assert_eq!(
        uri.default_value(),
        Some(&json!("file:///etc/app/config.json"))
    );
}

#[rstest]
fn prompt_capability_has_no_parameters() {
    let listing = PromptListing::new("greeting");

    let capability = Capability::prompt(&listing);

    assert_eq!(capability.public_name(), "prompt_greeting");
    assert_eq!(capability.description(), "Get the greeting prompt template");
    assert!(capability.parameter_schema().is_empty());
}

#[rstest]
fn resource_template_capability_requires_a_uri() {
    let capability = Capability::resource_template("report", "reports://{year}/{id}", None);

    assert_eq!(capability.public_name(), "resource_template_report");
    assert_eq!(
        capability.description(),
        "Read a resource matching the template URI: reports://{year}/{id}"
    );
    assert_eq!(
        capability.original_uri_template(),
        Some("reports://{year}/{id}")
    );
    let uri = capability
        .parameter_schema()
        .get(URI_PARAMETER)
        .expect("uri parameter should exist");
    assert!(!uri.is_optional());
    assert_eq!(
        uri.description(),
        Some("URI of the resource to read (must match template: reports://{year}/{id})")
    );
}

#[rstest]
fn server_descriptions_take_precedence() {
    let listing = ToolListing::new("echo", json!({})).with_description("Echoes input");
    assert_eq!(Capability::tool(&listing).description(), "Echoes input");
}

#[rstest]
fn empty_server_descriptions_fall_back_to_defaults() {
    let listing = ResourceListing::new("config", "file:///c").with_description("");
    assert_eq!(
        Capability::resource(&listing).description(),
        "Read the config resource"
    );
}

#[rstest]
fn descriptor_exposes_metadata_and_json_schema() {
    let capability = Capability::resource(&ResourceListing::new("config", "file:///c"));

    let descriptor = serde_json::to_value(capability.descriptor()).expect("should serialise");

    assert_eq!(descriptor.pointer("/name"), Some(&json!("resource_config")));
    assert_eq!(descriptor.pointer("/metadata/kind"), Some(&json!("resource")));
    assert_eq!(descriptor.pointer("/metadata/originalName"), Some(&json!("config")));
    assert_eq!(descriptor.pointer("/metadata/originalUri"), Some(&json!("file:///c")));
    assert_eq!(
        descriptor.pointer("/jsonSchema/properties/uri/default"),
        Some(&json!("file:///c"))
    );
    assert!(descriptor.pointer("/metadata/originalUriTemplate").is_none());
}

// ── Registry ───────────────────────────────────────────────────────

fn sample_registry() -> CapabilityRegistry {
    let mut registry = CapabilityRegistry::new();
    registry.register(Capability::tool(&ToolListing::new("echo", json!({}))));
    registry.register(Capability::resource(&ResourceListing::new(
        "config",
        "file:///c",
    )));
    registry.register(Capability::prompt(&PromptListing::new("greeting")));
    registry.register(Capability::resource_template(
        "report",
        "reports://{id}",
        None,
    ));
    registry
}

#[rstest]
fn registry_counts_by_kind() {
    let registry = sample_registry();

    assert_eq!(registry.len(), 4);
    for kind in CapabilityKind::DISCOVERY_ORDER {
        assert_eq!(registry.count_of(kind), 1, "expected one {kind}");
    }
}

#[rstest]
fn registered_names_resolve_to_their_entry() {
    let registry = sample_registry();

    let resolution = registry.resolve("resource_config");

    assert!(matches!(resolution, Resolution::Registered(_)));
    assert_eq!(resolution.kind(), CapabilityKind::Resource);
    assert_eq!(resolution.identifier(), "config");
}

#[rstest]
fn registry_entry_wins_over_prefix_convention() {
    let mut registry = CapabilityRegistry::new();
    registry.register(Capability::tool(&ToolListing::new(
        "resource_cleanup",
        json!({}),
    )));

    let resolution = registry.resolve("resource_cleanup");

    assert_eq!(resolution.kind(), CapabilityKind::Tool);
    assert_eq!(resolution.identifier(), "resource_cleanup");
}

#[rstest]
fn unknown_names_resolve_by_convention() {
    let registry = CapabilityRegistry::new();

    let resolution = registry.resolve("prompt_summary");

    assert_eq!(
        resolution,
        Resolution::ByConvention {
            kind: CapabilityKind::Prompt,
            identifier: "summary",
        }
    );
}

#[rstest]
fn first_registration_wins_on_collision() {
    let mut registry = CapabilityRegistry::new();
    registry.register(Capability::tool(
        &ToolListing::new("echo", json!({})).with_description("first"),
    ));
    registry.register(Capability::tool(
        &ToolListing::new("echo", json!({})).with_description("second"),
    ));

    let found = registry.get("echo").expect("echo should be registered");

    assert_eq!(found.description(), "first");
    assert_eq!(registry.len(), 2);
}

// ── Wire listings ──────────────────────────────────────────────────

#[rstest]
fn tool_listing_keeps_unmodelled_fields() {
    let wire = json!({
        "name": "echo",
        "title": "Echo",
        "inputSchema": { "type": "object", "properties": {} },
        "outputSchema": { "type": "object" },
        "annotations": { "readOnlyHint": true },
    });

    let listing: ToolListing = serde_json::from_value(wire.clone()).expect("should deserialise");

    assert_eq!(listing.extra.get("title"), Some(&json!("Echo")));
    assert_eq!(serde_json::to_value(&listing).expect("should serialise"), wire);
}

#[rstest]
#[case(json!({ "uri": "file:///a", "name": "a", "size": 12, "_meta": { "k": 1 } }))]
#[case(json!({ "uri": "file:///a", "name": "a", "annotations": { "priority": 0.5 } }))]
fn resource_listing_round_trips_unchanged(#[case] wire: Value) {
    let listing: ResourceListing =
        serde_json::from_value(wire.clone()).expect("should deserialise");

    assert_eq!(serde_json::to_value(&listing).expect("should serialise"), wire);
}

#[rstest]
fn prompt_and_template_listings_keep_titles() {
    let prompt_wire = json!({
        "name": "greeting",
        "title": "Greeting",
        "arguments": [{ "name": "who", "title": "Who" }],
    });
    let template_wire = json!({
        "name": "report",
        "uriTemplate": "reports://{id}",
        "title": "Report",
    });

    let prompt: PromptListing =
        serde_json::from_value(prompt_wire.clone()).expect("should deserialise");
    let template: ResourceTemplateListing =
        serde_json::from_value(template_wire.clone()).expect("should deserialise");

    assert_eq!(serde_json::to_value(&prompt).expect("should serialise"), prompt_wire);
    assert_eq!(serde_json::to_value(&template).expect("should serialise"), template_wire);
}

// ── Raw parameters ─────────────────────────────────────────────────

#[rstest]
#[case(RawParameters::Absent)]
#[case(RawParameters::Text(String::new()))]
#[case(RawParameters::Text("   ".to_owned()))]
#[case(RawParameters::Structured(Value::Null))]
#[case(RawParameters::Structured(json!("")))]
#[case(RawParameters::Structured(json!([])))]
fn empty_parameters_become_an_empty_object(#[case] raw: RawParameters) {
    assert_eq!(raw.into_object().expect("should normalise"), serde_json::Map::new());
}

#[rstest]
fn json_text_parameters_are_parsed() {
    let raw = RawParameters::from(r#"{"message":"hi"}"#);

    let object = raw.into_object().expect("should parse");

    assert_eq!(object.get("message"), Some(&json!("hi")));
}

#[rstest]
#[case(RawParameters::from("{not json"))]
#[case(RawParameters::from(json!("text")))]
fn invalid_json_text_is_rejected(#[case] raw: RawParameters) {
    let result = raw.into_object();
    assert!(matches!(result, Err(ParameterParseError::InvalidJson(_))));
}

#[rstest]
#[case(json!([1, 2]))]
#[case(json!("\"text\""))]
#[case(json!("[1]"))]
#[case(json!(42))]
#[case(json!(false))]
fn non_object_parameters_are_rejected(#[case] value: Value) {
    let result = RawParameters::from(value).into_object();
    assert_eq!(result, Err(ParameterParseError::NotAnObject));
}

#[rstest]
fn missing_parameters_deserialise_as_absent() {
    let raw: RawParameters = serde_json::from_value(Value::Null).expect("should deserialise");
    assert_eq!(raw, RawParameters::Absent);
}

// ── Invocation results ─────────────────────────────────────────────

#[rstest]
fn fallback_result_wraps_raw_value() {
    let result = InvocationResult::fallback(json!("plain"));

    assert_eq!(result.normalized().get(RAW_RESULT_FIELD), Some(&json!("plain")));
    assert_eq!(result.raw(), &json!("plain"));
}

// ── Connection lifecycle ───────────────────────────────────────────

#[rstest]
#[case(ConnectionState::Disconnected, ConnectionState::Connecting, true)]
#[case(ConnectionState::Connecting, ConnectionState::Connected, true)]
#[case(ConnectionState::Connecting, ConnectionState::Closed, true)]
#[case(ConnectionState::Connected, ConnectionState::Closing, true)]
#[case(ConnectionState::Closing, ConnectionState::Closed, true)]
#[case(ConnectionState::Closed, ConnectionState::Connecting, false)]
#[case(ConnectionState::Connected, ConnectionState::Connecting, false)]
#[case(ConnectionState::Disconnected, ConnectionState::Connected, false)]
fn connection_state_transitions(
    #[case] from: ConnectionState,
    #[case] to: ConnectionState,
    #[case] allowed: bool,
) {
    assert_eq!(from.can_transition_to(to), allowed, "{from} -> {to}");
}
