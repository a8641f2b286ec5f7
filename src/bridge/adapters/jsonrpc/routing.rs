//! Matching of incoming messages to the requests awaiting them.

use super::{
    REQUEST_TIMEOUT,
    message::{RpcReply, RpcResponse},
};
use crate::bridge::ports::{ProtocolError, ProtocolResult};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, oneshot};
use tracing::debug;

/// Requests awaiting a response, keyed by the id this client issued.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingRequests {
    waiting: Arc<Mutex<BTreeMap<u64, oneshot::Sender<RpcResponse>>>>,
}

impl PendingRequests {
    /// Registers `id` and returns the receiver its response is sent to.
    pub(crate) async fn register(&self, id: u64) -> oneshot::Receiver<RpcResponse> {
        let (sender, receiver) = oneshot::channel();
        self.waiting.lock().await.insert(id, sender);
        receiver
    }

    /// Drops the waiter for `id`.
    pub(crate) async fn forget(&self, id: u64) {
        self.waiting.lock().await.remove(&id);
    }

    /// Drops every waiter; their requests fail as closed.
    pub(crate) async fn clear(&self) {
        self.waiting.lock().await.clear();
    }

    /// Waits for the response to `id`, bounded by the request timeout.
    pub(crate) async fn wait(
        &self,
        id: u64,
        method: &str,
        receiver: oneshot::Receiver<RpcResponse>,
    ) -> ProtocolResult<Value> {
        match tokio::time::timeout(REQUEST_TIMEOUT, receiver).await {
            Ok(Ok(response)) => response.into_result(),
            Ok(Err(_)) => Err(ProtocolError::Transport(format!(
                "connection closed before '{method}' completed"
            ))),
            Err(_) => {
                self.forget(id).await;
                Err(ProtocolError::Transport(format!(
                    "request '{method}' timed out"
                )))
            }
        }
    }

    /// Routes one incoming message.
    ///
    /// Responses complete their pending request. Server requests never do;
    /// the reply they are owed is returned for the caller to send back.
    pub(crate) async fn route(&self, text: &str) -> Option<RpcReply> {
        if text.trim().is_empty() {
            return None;
        }
        let incoming = match serde_json::from_str::<RpcResponse>(text) {
            Ok(incoming) => incoming,
            Err(err) => {
                debug!(error = %err, "ignoring non JSON-RPC message");
                return None;
            }
        };

        if let Some(method) = incoming.method.as_deref() {
            return match incoming.id.clone() {
                Some(id) => {
                    debug!(method, "answering server request");
                    Some(RpcReply::for_server_request(id, method))
                }
                None => {
                    debug!(method, "ignoring server notification");
                    None
                }
            };
        }

        let Some(id) = incoming.request_id() else {
            debug!("ignoring server message without a request id");
            return None;
        };
        match self.waiting.lock().await.remove(&id) {
            Some(sender) => {
                if sender.send(incoming).is_err() {
                    debug!(id, "response arrived after the request was abandoned");
                }
            }
            None => debug!(id, "response does not match a pending request"),
        }
        None
    }
}
