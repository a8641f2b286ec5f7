//! JSON-RPC over the HTTP+SSE transport.
//!
//! The client holds a `GET` event stream open. The server's first `endpoint`
//! event names the URL that requests are `POST`ed to. Every response and
//! server request then arrives as a `message` event on the stream.

use super::{
    REQUEST_TIMEOUT, RpcConnection,
    http::header_map,
    message::{RpcNotification, RpcRequest},
    routing::PendingRequests,
};
use crate::bridge::{
    domain::{NetworkChannel, TransportErrorHook},
    ports::{ProtocolError, ProtocolResult},
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use reqwest::header::ACCEPT;
use reqwest_eventsource::{Event, EventSource};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

const EVENT_STREAM: &str = "text/event-stream";
const ENDPOINT_EVENT: &str = "endpoint";
const MESSAGE_EVENT: &str = "message";
const ENDPOINT_TIMEOUT: Duration = Duration::from_secs(10);

/// Session over a server-sent event stream and its message endpoint.
#[derive(Debug)]
pub(crate) struct SseConnection {
    poster: MessagePoster,
    pending: PendingRequests,
    next_id: AtomicU64,
    closing: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

/// Sends messages to the endpoint announced on the stream.
#[derive(Debug, Clone)]
struct MessagePoster {
    client: reqwest::Client,
    endpoint: Url,
}

impl MessagePoster {
    async fn post<T: Serialize + Sync>(&self, message: &T) -> ProtocolResult<()> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(REQUEST_TIMEOUT)
            .json(message)
            .send()
            .await
            .map_err(ProtocolError::transport)?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ProtocolError::Transport(format!(
                "server answered with HTTP {status}"
            )))
        }
    }
}

impl SseConnection {
    /// Opens the event stream and waits for the server's endpoint.
    ///
    /// # Errors
    ///
    /// Fails when the stream cannot be opened or no usable endpoint is
    /// announced in time.
    pub(crate) async fn open(
        channel: &NetworkChannel,
        error_hook: TransportErrorHook,
    ) -> ProtocolResult<Self> {
        let stream_url = Url::parse(&channel.url).map_err(|err| {
            ProtocolError::Transport(format!("invalid server URL '{}': {err}", channel.url))
        })?;
        let client = reqwest::Client::builder()
            .default_headers(header_map(channel)?)
            .build()
            .map_err(ProtocolError::transport)?;
        let mut events = EventSource::new(
            client
                .get(stream_url.clone())
                .header(ACCEPT, EVENT_STREAM),
        )
        .map_err(ProtocolError::transport)?;

        let announced =
            tokio::time::timeout(ENDPOINT_TIMEOUT, wait_for_endpoint(&mut events, &stream_url))
                .await
                .unwrap_or_else(|_| {
                    Err(ProtocolError::transport(
                        "server did not announce a message endpoint",
                    ))
                });
        let endpoint = match announced {
            Ok(endpoint) => endpoint,
            Err(err) => {
                events.close();
                return Err(err);
            }
        };
        debug!(url = %stream_url, endpoint = %endpoint, "opened SSE connection to MCP server");

        let poster = MessagePoster { client, endpoint };
        let pending = PendingRequests::default();
        let closing = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_events(
            events,
            poster.clone(),
            pending.clone(),
            Arc::clone(&closing),
            error_hook,
        ));

        Ok(Self {
            poster,
            pending,
            next_id: AtomicU64::new(1),
            closing,
            reader,
        })
    }
}

impl Drop for SseConnection {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

#[async_trait]
impl RpcConnection for SseConnection {
    async fn request(&self, method: &str, params: Option<Value>) -> ProtocolResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let receiver = self.pending.register(id).await;

        if let Err(err) = self.poster.post(&RpcRequest::new(id, method, params)).await {
            self.pending.forget(id).await;
            return Err(err);
        }

        self.pending.wait(id, method, receiver).await
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> ProtocolResult<()> {
        self.poster.post(&RpcNotification::new(method, params)).await
    }

    async fn shutdown(&mut self) -> ProtocolResult<()> {
        self.closing.store(true, Ordering::SeqCst);
        self.reader.abort();
        self.pending.clear().await;
        Ok(())
    }
}

async fn wait_for_endpoint(events: &mut EventSource, stream_url: &Url) -> ProtocolResult<Url> {
    while let Some(event) = events.next().await {
        match event {
            Ok(Event::Open) => debug!(url = %stream_url, "SSE stream opened"),
            Ok(Event::Message(message)) if message.event == ENDPOINT_EVENT => {
                return resolve_endpoint(stream_url, &message.data);
            }
            Ok(Event::Message(message)) => {
                debug!(event = %message.event, "ignoring SSE event before the endpoint");
            }
            Err(err) => {
                return Err(ProtocolError::Transport(format!(
                    "failed to open SSE stream: {err}"
                )));
            }
        }
    }
    Err(ProtocolError::transport(
        "SSE stream ended before announcing a message endpoint",
    ))
}

async fn read_events(
    mut events: EventSource,
    poster: MessagePoster,
    pending: PendingRequests,
    closing: Arc<AtomicBool>,
    error_hook: TransportErrorHook,
) {
    let fault = loop {
        match events.next().await {
            Some(Ok(Event::Message(message))) if is_message_event(&message.event) => {
                let Some(reply) = pending.route(&message.data).await else {
                    continue;
                };
                if let Err(err) = poster.post(&reply).await {
                    debug!(error = %err, "failed to answer server request");
                }
            }
            Some(Ok(Event::Message(message))) => {
                debug!(event = %message.event, "ignoring SSE event");
            }
            Some(Ok(Event::Open)) => debug!("SSE stream reopened"),
            Some(Err(err)) => break format!("SSE stream failed: {err}"),
            None => break "server closed its event stream".to_owned(),
        }
    };
    events.close();
    pending.clear().await;
    if !closing.load(Ordering::SeqCst) {
        error_hook(&fault);
    }
}

/// Unnamed events default to `message`.
fn is_message_event(event: &str) -> bool {
    event.is_empty() || event == MESSAGE_EVENT
}

/// Resolves the announced endpoint against the stream URL.
///
/// The endpoint must share the stream's origin so headers are never sent to
/// a host the caller did not configure.
fn resolve_endpoint(stream_url: &Url, data: &str) -> ProtocolResult<Url> {
    let announced = data.trim();
    let endpoint = stream_url.join(announced).map_err(|err| {
        ProtocolError::Transport(format!("invalid message endpoint '{announced}': {err}"))
    })?;
    if endpoint.origin() != stream_url.origin() {
        return Err(ProtocolError::Transport(format!(
            "message endpoint '{endpoint}' is not on the server's origin"
        )));
    }
    Ok(endpoint)
}
