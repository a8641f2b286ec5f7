//! Per-invocation bridge service running one host operation per connection.

use super::{
    BridgeError, BridgeResult, ConnectionManager, ExecutionDispatcher, TransportFactory,
    discover_capabilities, normalize_result,
};
use crate::bridge::{
    config::{BridgeConfig, OperationParameters},
    domain::{CapabilityRegistry, ConnectionProfile, InvocationRequest, InvocationResult},
    ports::{ClientProvider, ProtocolClient, ProtocolError},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info};

/// Operation requested by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BridgeOperation {
    /// Discover every capability and return their descriptors.
    DiscoverCapabilities,
    /// Execute one capability by public name.
    ExecuteTool(InvocationRequest),
    /// Return the raw tool listing.
    ListTools,
    /// Return the raw resource listing.
    ListResources,
    /// Return the raw resource template listing.
    ListResourceTemplates,
    /// Return the raw prompt listing.
    ListPrompts,
    /// Read one resource and normalise its content.
    ReadResource {
        /// Resource URI.
        uri: String,
    },
    /// Fetch one prompt.
    GetPrompt {
        /// Prompt name.
        name: String,
    },
}

impl BridgeOperation {
    /// Parses a host operation name and its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::UnsupportedOperation`] for unknown names and
    /// [`BridgeError::Validation`] when a required parameter is missing.
    pub fn from_host(operation: &str, parameters: OperationParameters) -> BridgeResult<Self> {
        let OperationParameters {
            tool_name,
            tool_parameters,
            resource_uri,
            prompt_name,
        } = parameters;
        match operation {
            "discoverCapabilities" => Ok(Self::DiscoverCapabilities),
            "executeTool" => {
                let name = required(tool_name, "toolName", operation)?;
                Ok(Self::ExecuteTool(InvocationRequest::new(name, tool_parameters)))
            }
            "listTools" => Ok(Self::ListTools),
            "listResources" => Ok(Self::ListResources),
            "listResourceTemplates" => Ok(Self::ListResourceTemplates),
            "listPrompts" => Ok(Self::ListPrompts),
            "readResource" => Ok(Self::ReadResource {
                uri: required(resource_uri, "resourceUri", operation)?,
            }),
            "getPrompt" => Ok(Self::GetPrompt {
                name: required(prompt_name, "promptName", operation)?,
            }),
            other => Err(BridgeError::UnsupportedOperation(other.to_owned())),
        }
    }

    /// Returns the host-facing operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::DiscoverCapabilities => "discoverCapabilities",
            Self::ExecuteTool(_) => "executeTool",
            Self::ListTools => "listTools",
            Self::ListResources => "listResources",
            Self::ListResourceTemplates => "listResourceTemplates",
            Self::ListPrompts => "listPrompts",
            Self::ReadResource { .. } => "readResource",
            Self::GetPrompt { .. } => "getPrompt",
        }
    }
}

fn required(value: Option<String>, field: &str, operation: &str) -> BridgeResult<String> {
    value
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| BridgeError::validation(format!("{field} is required for {operation}")))
}

/// Runs host operations, each inside its own connect/close scope.
#[derive(Debug, Clone)]
pub struct CapabilityBridge<P>
where
    P: ClientProvider,
{
    provider: P,
    factory: TransportFactory,
    resolve_via_discovery: bool,
}

impl<P> CapabilityBridge<P>
where
    P: ClientProvider,
{
    /// Creates a bridge that dispatches by naming convention only.
    #[must_use]
    pub const fn new(provider: P, factory: TransportFactory) -> Self {
        Self {
            provider,
            factory,
            resolve_via_discovery: false,
        }
    }

    /// Creates a bridge from host settings, capturing the ambient
    /// environment once.
    #[must_use]
    pub fn from_config(provider: P, config: &BridgeConfig) -> Self {
        Self::new(provider, TransportFactory::new(config.ambient_environment()))
            .with_resolve_via_discovery(config.resolve_via_discovery)
    }

    /// Runs discovery before every `executeTool` so registered schemas
    /// validate the parameters.
    #[must_use]
    pub const fn with_resolve_via_discovery(mut self, enabled: bool) -> Self {
        self.resolve_via_discovery = enabled;
        self
    }

    /// Returns the transport factory.
    #[must_use]
    pub const fn factory(&self) -> &TransportFactory {
        &self.factory
    }

    /// Connects with `profile`, runs `operation`, and closes the connection
    /// whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the [`BridgeError`] of the failing step.
    pub async fn invoke(
        &self,
        profile: &ConnectionProfile,
        operation: BridgeOperation,
    ) -> BridgeResult<Value> {
        let operation_name = operation.name();
        info!(
            operation = operation_name,
            transport = %profile.transport_kind(),
            "running MCP operation"
        );

        let channel = self.factory.build(profile);
        let mut manager = ConnectionManager::new(self.provider.new_client());
        let outcome = match manager.connect(channel).await {
            Ok(()) => self.run(&manager, operation).await,
            Err(err) => Err(err),
        };
        manager.close().await;

        outcome.inspect_err(|err| {
            error!(operation = operation_name, error = %err, "MCP operation failed");
        })
    }

    async fn run(
        &self,
        manager: &ConnectionManager<P::Client>,
        operation: BridgeOperation,
    ) -> BridgeResult<Value> {
        let client = manager.client()?;
        let operation_name = operation.name();
        match operation {
            BridgeOperation::DiscoverCapabilities => {
                let registry = discover_capabilities(client).await;
                wrap_listing(operation_name, "tools", &registry.descriptors())
            }
            BridgeOperation::ExecuteTool(request) => self
                .execute(client, request)
                .await
                .map(InvocationResult::into_payload),
            BridgeOperation::ListTools => {
                let tools = client
                    .list_tools()
                    .await
                    .map_err(|err| BridgeError::call(operation_name, &err))?;
                wrap_listing(operation_name, "tools", &tools)
            }
            BridgeOperation::ListResources => {
                let resources = client
                    .list_resources()
                    .await
                    .map_err(|err| BridgeError::call(operation_name, &err))?;
                wrap_listing(operation_name, "resources", &resources)
            }
            BridgeOperation::ListResourceTemplates => {
                let templates = client
                    .list_resource_templates()
                    .await
                    .map_err(|err| BridgeError::call(operation_name, &err))?;
                wrap_listing(operation_name, "resourceTemplates", &templates)
            }
            BridgeOperation::ListPrompts => {
                let prompts = client
                    .list_prompts()
                    .await
                    .map_err(|err| BridgeError::call(operation_name, &err))?;
                wrap_listing(operation_name, "prompts", &prompts)
            }
            BridgeOperation::ReadResource { uri } => {
                let raw = client
                    .read_resource(&uri)
                    .await
                    .map_err(|err| BridgeError::call(&uri, &err))?;
                Ok(normalize_result(&uri, raw).into_payload())
            }
            BridgeOperation::GetPrompt { name } => client
                .get_prompt(&name)
                .await
                .map_err(|err| BridgeError::call(&name, &err)),
        }
    }

    async fn execute(
        &self,
        client: &P::Client,
        request: InvocationRequest,
    ) -> BridgeResult<InvocationResult> {
        let registry = if self.resolve_via_discovery {
            discover_capabilities(client).await
        } else {
            CapabilityRegistry::new()
        };
        debug!(
            capability = %request.public_name,
            registered = registry.len(),
            "executing capability"
        );
        ExecutionDispatcher::new(client, &registry)
            .dispatch(request)
            .await
    }
}

fn wrap_listing<T>(operation: &str, field: &str, items: &T) -> BridgeResult<Value>
where
    T: Serialize + ?Sized,
{
    let value = serde_json::to_value(items).map_err(|err| {
        BridgeError::call(operation, &ProtocolError::MalformedResponse(err.to_string()))
    })?;
    let mut wrapped = Map::new();
    wrapped.insert(field.to_owned(), value);
    Ok(Value::Object(wrapped))
}
