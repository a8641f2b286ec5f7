//! Protocol client port for MCP capability discovery and invocation.

use crate::bridge::domain::{
    PromptListing, ResourceListing, ResourceTemplateListing, ToolListing, TransportChannel,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Result type for protocol client operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Client contract for one MCP server connection.
///
/// A client is connected at most once and closed at most once; the
/// connection manager enforces that ordering.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProtocolClient: Send + Sync {
    /// Opens `channel` and performs the protocol handshake.
    async fn connect(&mut self, channel: TransportChannel) -> ProtocolResult<()>;

    /// Releases the connection and its transport.
    async fn close(&mut self) -> ProtocolResult<()>;

    /// Lists tools.
    async fn list_tools(&self) -> ProtocolResult<Vec<ToolListing>>;

    /// Lists resources.
    async fn list_resources(&self) -> ProtocolResult<Vec<ResourceListing>>;

    /// Lists resource templates.
    async fn list_resource_templates(&self) -> ProtocolResult<Vec<ResourceTemplateListing>>;

    /// Lists prompts.
    async fn list_prompts(&self) -> ProtocolResult<Vec<PromptListing>>;

    /// Calls a tool with an argument object.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ProtocolResult<Value>;

    /// Reads a resource by URI.
    async fn read_resource(&self, uri: &str) -> ProtocolResult<Value>;

    /// Fetches a prompt by name.
    async fn get_prompt(&self, name: &str) -> ProtocolResult<Value>;
}

/// Source of fresh, unconnected protocol clients.
///
/// Every invocation gets its own client; clients are never reused.
pub trait ClientProvider: Send + Sync {
    /// Client type produced by this provider.
    type Client: ProtocolClient;

    /// Creates an unconnected client.
    fn new_client(&self) -> Self::Client;
}

/// Errors returned by protocol client adapters.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProtocolError {
    /// The transport failed to open, send, or receive.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered with a JSON-RPC error.
    #[error("{message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional structured detail.
        data: Option<Value>,
    },

    /// The client has no open connection.
    #[error("protocol client is not connected")]
    NotConnected,

    /// The server response could not be decoded.
    #[error("malformed protocol response: {0}")]
    MalformedResponse(String),
}

impl ProtocolError {
    /// Wraps a transport-level failure.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    /// Creates a JSON-RPC error without data.
    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Attaches structured detail to a JSON-RPC error.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_data(self, detail: Value) -> Self {
        match self {
            Self::Rpc { code, message, .. } => Self::Rpc {
                code,
                message,
                data: Some(detail),
            },
            other => other,
        }
    }

    /// Returns the structured detail, if any.
    #[must_use]
    pub const fn data(&self) -> Option<&Value> {
        match self {
            Self::Rpc { data, .. } => data.as_ref(),
            _ => None,
        }
    }
}
