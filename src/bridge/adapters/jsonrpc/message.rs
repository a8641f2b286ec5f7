//! JSON-RPC 2.0 envelopes exchanged with MCP servers.

use crate::bridge::ports::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const JSONRPC_VERSION: &str = "2.0";
const PING_METHOD: &str = "ping";
const METHOD_NOT_FOUND: i64 = -32601;

/// Request expecting a response with the same id.
#[derive(Debug, Serialize)]
pub(crate) struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl<'a> RpcRequest<'a> {
    pub(crate) const fn new(id: u64, method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            method,
            params,
        }
    }
}

/// Fire-and-forget message without an id.
#[derive(Debug, Serialize)]
pub(crate) struct RpcNotification<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<Value>,
}

impl<'a> RpcNotification<'a> {
    pub(crate) const fn new(method: &'a str, params: Option<Value>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
        }
    }
}

/// Incoming message from the server.
///
/// Responses carry an id this client issued and no `method`. Messages with a
/// `method` are server requests (with an id from the server's own id space)
/// or notifications (without an id).
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub(crate) id: Option<Value>,
    #[serde(default)]
    pub(crate) method: Option<String>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Returns whether this is a response to one of our requests.
    pub(crate) const fn is_response(&self) -> bool {
        self.method.is_none() && self.id.is_some()
    }

    /// Returns the id as issued by this client, if it is one.
    pub(crate) fn request_id(&self) -> Option<u64> {
        if self.method.is_some() {
            return None;
        }
        match self.id.as_ref()? {
            Value::Number(number) => number.as_u64(),
            Value::String(text) => text.parse().ok(),
            _ => None,
        }
    }

    /// Splits the envelope into its result or its error.
    pub(crate) fn into_result(self) -> ProtocolResult<Value> {
        match (self.error, self.result) {
            (Some(error), _) => Err(error.into()),
            (None, Some(result)) => Ok(result),
            (None, None) => Err(ProtocolError::MalformedResponse(
                "response carries neither a result nor an error".to_owned(),
            )),
        }
    }
}

/// Reply this client owes to a server-initiated request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RpcReply {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcReplyError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct RpcReplyError {
    code: i64,
    message: String,
}

impl RpcReply {
    /// Answers `ping` with an empty result and anything else with
    /// method-not-found.
    pub(crate) fn for_server_request(id: Value, method: &str) -> Self {
        let (result, error) = if method == PING_METHOD {
            (Some(Value::Object(Map::new())), None)
        } else {
            (
                None,
                Some(RpcReplyError {
                    code: METHOD_NOT_FOUND,
                    message: format!("Method not found: {method}"),
                }),
            )
        };
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result,
            error,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl From<RpcErrorObject> for ProtocolError {
    fn from(error: RpcErrorObject) -> Self {
        let base = Self::rpc(error.code, error.message);
        match error.data {
            Some(detail) => base.with_data(detail),
            None => base,
        }
    }
}
