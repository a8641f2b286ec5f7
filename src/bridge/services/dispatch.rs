//! Execution dispatcher mapping public names back to protocol calls.

use super::{BridgeError, BridgeResult, normalize_result};
use crate::bridge::{
    domain::{
        Capability, CapabilityKind, CapabilityRegistry, InvocationRequest, InvocationResult,
        Resolution, URI_PARAMETER, uri_matches_template,
    },
    ports::ProtocolClient,
};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

/// Dispatches invocation requests against one connected client.
pub struct ExecutionDispatcher<'a, C>
where
    C: ProtocolClient + ?Sized,
{
    client: &'a C,
    registry: &'a CapabilityRegistry,
}

impl<'a, C> ExecutionDispatcher<'a, C>
where
    C: ProtocolClient + ?Sized,
{
    /// Creates a dispatcher over a connected client and the capabilities
    /// discovered in this session.
    ///
    /// The registry may be empty, in which case every name resolves through
    /// the prefix naming convention.
    #[must_use]
    pub const fn new(client: &'a C, registry: &'a CapabilityRegistry) -> Self {
        Self { client, registry }
    }

    /// Validates parameters, performs the underlying call, and normalises
    /// the result.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Validation`] naming the capability when the
    /// parameters are malformed or a required `uri` is missing; no call is
    /// made in that case. Returns [`BridgeError::Call`] when the server
    /// rejects the call.
    pub async fn dispatch(&self, request: InvocationRequest) -> BridgeResult<InvocationResult> {
        let InvocationRequest {
            public_name,
            parameters,
        } = request;
        let arguments = parameters
            .into_object()
            .map_err(|err| BridgeError::invalid_parameters(&public_name, err.to_string()))?;

        let resolution = self.registry.resolve(&public_name);
        let validated = match resolution {
            Resolution::Registered(capability) => capability
                .parameter_schema()
                .validate(&arguments)
                .map_err(|err| BridgeError::invalid_parameters(&public_name, err.to_string()))?,
            Resolution::ByConvention { .. } => arguments,
        };

        let kind = resolution.kind();
        debug!(capability = %public_name, kind = %kind, "dispatching capability");

        let outcome = match kind {
            resource if resource.reads_resource() => {
                let uri = required_uri(&public_name, kind, &validated)?;
                if let Resolution::Registered(capability) = resolution {
                    warn_on_template_mismatch(capability, uri);
                }
                self.client.read_resource(uri).await
            }
            CapabilityKind::Prompt => self.client.get_prompt(resolution.identifier()).await,
            _ => {
                self.client
                    .call_tool(resolution.identifier(), validated)
                    .await
            }
        };

        let raw = outcome.map_err(|err| {
            error!(capability = %public_name, error = %err, "failed to execute capability");
            BridgeError::call(&public_name, &err)
        })?;
        debug!(capability = %public_name, "capability executed successfully");

        Ok(normalize_result(&public_name, raw))
    }
}

fn required_uri<'v>(
    public_name: &str,
    kind: CapabilityKind,
    arguments: &'v Map<String, Value>,
) -> BridgeResult<&'v str> {
    arguments
        .get(URI_PARAMETER)
        .and_then(Value::as_str)
        .filter(|uri| !uri.is_empty())
        .ok_or_else(|| {
            let label = match kind {
                CapabilityKind::ResourceTemplate => "resource template",
                _ => "resource",
            };
            BridgeError::invalid_parameters(
                public_name,
                format!("parameter '{URI_PARAMETER}' (string) is required for {label} capability '{public_name}'"),
            )
        })
}

fn warn_on_template_mismatch(capability: &Capability, uri: &str) {
    if let Some(template) = capability
        .original_uri_template()
        .filter(|template| !uri_matches_template(template, uri))
    {
        warn!(
            capability = capability.public_name(),
            uri,
            template,
            "provided URI might not match the resource template"
        );
    }
}
