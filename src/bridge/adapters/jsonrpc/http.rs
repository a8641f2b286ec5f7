//! JSON-RPC over HTTP `POST` to a remote MCP endpoint.

use super::{
    REQUEST_TIMEOUT, RpcConnection,
    message::{RpcNotification, RpcRequest, RpcResponse},
};
use crate::bridge::{
    domain::NetworkChannel,
    ports::{ProtocolError, ProtocolResult},
};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const SESSION_HEADER: &str = "mcp-session-id";
const ACCEPTED_TYPES: &str = "application/json, text/event-stream";
const EVENT_STREAM: &str = "text/event-stream";

/// Stateless request/response session with a remote server.
///
/// A session id issued by the server is echoed on later requests.
#[derive(Debug)]
pub(crate) struct HttpConnection {
    client: reqwest::Client,
    url: String,
    session_id: Mutex<Option<String>>,
    next_id: AtomicU64,
}

impl HttpConnection {
    /// Prepares a client sending the channel's headers on every request.
    pub(crate) fn open(channel: &NetworkChannel) -> ProtocolResult<Self> {
        let client = reqwest::Client::builder()
            .default_headers(header_map(channel)?)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(ProtocolError::transport)?;
        debug!(url = %channel.url, "prepared HTTP connection to MCP server");

        Ok(Self {
            client,
            url: channel.url.clone(),
            session_id: Mutex::new(None),
            next_id: AtomicU64::new(1),
        })
    }

    fn session_id(&self) -> ProtocolResult<Option<String>> {
        Ok(self
            .session_id
            .lock()
            .map_err(ProtocolError::transport)?
            .clone())
    }

    fn store_session_id(&self, session: String) -> ProtocolResult<()> {
        *self.session_id.lock().map_err(ProtocolError::transport)? = Some(session);
        Ok(())
    }

    async fn post<T: Serialize + Sync>(&self, message: &T) -> ProtocolResult<Option<RpcResponse>> {
        let mut request = self
            .client
            .post(&self.url)
            .header(ACCEPT, ACCEPTED_TYPES)
            .json(message);
        if let Some(session) = self.session_id()? {
            request = request.header(SESSION_HEADER, session);
        }

        let response = request.send().await.map_err(ProtocolError::transport)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ProtocolError::Transport(format!(
                "server answered with HTTP {status}"
            )));
        }
        if let Some(session) = header_text(response.headers(), SESSION_HEADER) {
            self.store_session_id(session)?;
        }
        let is_event_stream = header_text(response.headers(), CONTENT_TYPE.as_str())
            .is_some_and(|content_type| content_type.starts_with(EVENT_STREAM));

        let body = response.text().await.map_err(ProtocolError::transport)?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        if is_event_stream {
            return Ok(last_event_response(&body));
        }
        serde_json::from_str(&body)
            .map(Some)
            .map_err(|err| ProtocolError::MalformedResponse(err.to_string()))
    }
}

#[async_trait]
impl RpcConnection for HttpConnection {
    async fn request(&self, method: &str, params: Option<Value>) -> ProtocolResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.post(&RpcRequest::new(id, method, params))
            .await?
            .ok_or_else(|| {
                ProtocolError::MalformedResponse(format!("empty response to '{method}'"))
            })?
            .into_result()
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> ProtocolResult<()> {
        self.post(&RpcNotification::new(method, params)).await?;
        Ok(())
    }

    async fn shutdown(&mut self) -> ProtocolResult<()> {
        let Some(session) = self.session_id()? else {
            return Ok(());
        };
        let outcome = self
            .client
            .delete(&self.url)
            .header(SESSION_HEADER, session)
            .send()
            .await;
        if let Err(err) = outcome {
            debug!(error = %err, "failed to end HTTP session");
        }
        *self.session_id.get_mut().map_err(ProtocolError::transport)? = None;
        Ok(())
    }
}

/// Converts the channel's headers, rejecting names or values HTTP forbids.
pub(super) fn header_map(channel: &NetworkChannel) -> ProtocolResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in &channel.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
            ProtocolError::Transport(format!("invalid header name '{name}': {err}"))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|err| {
            ProtocolError::Transport(format!("invalid value for header '{name}': {err}"))
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

fn header_text(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

/// Picks the last response carried by `data:` lines of an event stream body.
///
/// Server requests and notifications interleaved in the stream are skipped.
fn last_event_response(body: &str) -> Option<RpcResponse> {
    body.lines()
        .rev()
        .filter_map(|line| line.strip_prefix("data:"))
        .filter_map(|data| serde_json::from_str::<RpcResponse>(data.trim()).ok())
        .find(RpcResponse::is_response)
}
