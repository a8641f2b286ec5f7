//! Protocol client speaking MCP over a JSON-RPC connection.

use super::{RpcConnection, http::HttpConnection, sse::SseConnection, stdio::StdioConnection};
use crate::bridge::{
    domain::{
        ChannelTarget, ClientInfo, NetworkChannel, PromptListing, ResourceListing,
        ResourceTemplateListing, ToolListing, TransportChannel, TransportErrorHook,
    },
    ports::{ClientProvider, ProtocolClient, ProtocolError, ProtocolResult},
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::debug;

/// MCP protocol revision announced during the handshake.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// MCP client over a JSON-RPC connection opened from a transport channel.
#[derive(Debug)]
pub struct JsonRpcProtocolClient {
    client_info: ClientInfo,
    connection: Option<Box<dyn RpcConnection>>,
}

impl JsonRpcProtocolClient {
    /// Creates an unconnected client announcing `client_info`.
    #[must_use]
    pub const fn new(client_info: ClientInfo) -> Self {
        Self {
            client_info,
            connection: None,
        }
    }

    fn connection(&self) -> ProtocolResult<&dyn RpcConnection> {
        self.connection
            .as_deref()
            .ok_or(ProtocolError::NotConnected)
    }

    async fn handshake(&self) -> ProtocolResult<()> {
        let connection = self.connection()?;
        let params = json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {},
            "clientInfo": {
                "name": self.client_info.name,
                "version": self.client_info.version,
            },
        });
        let initialized = connection.request("initialize", Some(params)).await?;
        debug!(
            server = ?initialized.get("serverInfo"),
            protocol_version = ?initialized.get("protocolVersion"),
            "MCP handshake completed"
        );
        connection.notify("notifications/initialized", None).await
    }

    /// Collects every page of a listing by following `nextCursor`.
    async fn list_all<T>(&self, method: &str, field: &str) -> ProtocolResult<Vec<T>>
    where
        T: DeserializeOwned + Send,
    {
        let connection = self.connection()?;
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let params = cursor.as_ref().map(|value| json!({ "cursor": value }));
            let page = connection.request(method, params).await?;
            let entries = page
                .get(field)
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new()));
            let decoded: Vec<T> = serde_json::from_value(entries)
                .map_err(|err| ProtocolError::MalformedResponse(format!("{method}: {err}")))?;
            items.extend(decoded);

            match page
                .get("nextCursor")
                .and_then(Value::as_str)
                .filter(|next| !next.is_empty())
            {
                Some(next) if cursor.as_deref() != Some(next) => cursor = Some(next.to_owned()),
                _ => break,
            }
        }
        Ok(items)
    }
}

/// Opens an HTTP+SSE session, falling back to streamable HTTP when the
/// server offers no event stream.
async fn open_network(
    network: &NetworkChannel,
    error_hook: TransportErrorHook,
) -> ProtocolResult<Box<dyn RpcConnection>> {
    match SseConnection::open(network, error_hook).await {
        Ok(connection) => Ok(Box::new(connection)),
        Err(err) => {
            debug!(
                url = %network.url,
                error = %err,
                "SSE handshake failed, using streamable HTTP"
            );
            Ok(Box::new(HttpConnection::open(network)?))
        }
    }
}

#[async_trait]
impl ProtocolClient for JsonRpcProtocolClient {
    async fn connect(&mut self, channel: TransportChannel) -> ProtocolResult<()> {
        if self.connection.is_some() {
            return Err(ProtocolError::transport("client is already connected"));
        }
        let connection: Box<dyn RpcConnection> = match channel.target() {
            ChannelTarget::Process(process) => {
                Box::new(StdioConnection::spawn(process, channel.error_hook())?)
            }
            ChannelTarget::Network(network) => {
                open_network(network, channel.error_hook()).await?
            }
        };
        // Held before the handshake so a failed handshake can still be closed.
        self.connection = Some(connection);
        self.handshake().await
    }

    async fn close(&mut self) -> ProtocolResult<()> {
        match self.connection.take() {
            Some(mut connection) => connection.shutdown().await,
            None => Ok(()),
        }
    }

    async fn list_tools(&self) -> ProtocolResult<Vec<ToolListing>> {
        self.list_all("tools/list", "tools").await
    }

    async fn list_resources(&self) -> ProtocolResult<Vec<ResourceListing>> {
        self.list_all("resources/list", "resources").await
    }

    async fn list_resource_templates(&self) -> ProtocolResult<Vec<ResourceTemplateListing>> {
        self.list_all("resources/templates/list", "resourceTemplates")
            .await
    }

    async fn list_prompts(&self) -> ProtocolResult<Vec<PromptListing>> {
        self.list_all("prompts/list", "prompts").await
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ProtocolResult<Value> {
        self.connection()?
            .request(
                "tools/call",
                Some(json!({ "name": name, "arguments": arguments })),
            )
            .await
    }

    async fn read_resource(&self, uri: &str) -> ProtocolResult<Value> {
        self.connection()?
            .request("resources/read", Some(json!({ "uri": uri })))
            .await
    }

    async fn get_prompt(&self, name: &str) -> ProtocolResult<Value> {
        self.connection()?
            .request("prompts/get", Some(json!({ "name": name })))
            .await
    }
}

/// Provides fresh JSON-RPC clients sharing one client identity.
#[derive(Debug, Clone, Default)]
pub struct JsonRpcClientProvider {
    client_info: ClientInfo,
}

impl JsonRpcClientProvider {
    /// Creates a provider announcing `client_info`.
    #[must_use]
    pub const fn new(client_info: ClientInfo) -> Self {
        Self { client_info }
    }
}

impl ClientProvider for JsonRpcClientProvider {
    type Client = JsonRpcProtocolClient;

    fn new_client(&self) -> Self::Client {
        JsonRpcProtocolClient::new(self.client_info.clone())
    }
}
