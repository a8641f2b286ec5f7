//! JSON-RPC 2.0 protocol client over STDIO, HTTP+SSE, or streamable HTTP.

mod client;
mod http;
mod message;
mod routing;
mod sse;
mod stdio;

use crate::bridge::ports::ProtocolResult;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::Duration;

pub use client::{JsonRpcClientProvider, JsonRpcProtocolClient, PROTOCOL_VERSION};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Request/response exchange with one server, independent of transport.
#[async_trait]
trait RpcConnection: fmt::Debug + Send + Sync {
    /// Sends a request and waits for its response.
    async fn request(&self, method: &str, params: Option<Value>) -> ProtocolResult<Value>;

    /// Sends a notification.
    async fn notify(&self, method: &str, params: Option<Value>) -> ProtocolResult<()>;

    /// Releases the transport.
    async fn shutdown(&mut self) -> ProtocolResult<()>;
}
