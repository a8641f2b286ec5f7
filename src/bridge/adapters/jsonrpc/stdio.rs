//! JSON-RPC over the STDIO pipes of a spawned server process.

use super::{
    RpcConnection,
    message::{RpcNotification, RpcRequest},
    routing::PendingRequests,
};
use crate::bridge::{
    domain::{ProcessChannel, TransportErrorHook},
    ports::{ProtocolError, ProtocolResult},
};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

type SharedStdin = Arc<Mutex<ChildStdin>>;

/// Newline-delimited JSON-RPC session with a child process.
///
/// The child is killed when the connection is dropped.
#[derive(Debug)]
pub(crate) struct StdioConnection {
    child: Child,
    stdin: SharedStdin,
    pending: PendingRequests,
    next_id: AtomicU64,
    closing: Arc<AtomicBool>,
    reader: JoinHandle<()>,
    stderr_forwarder: JoinHandle<()>,
}

impl StdioConnection {
    /// Spawns the server with exactly the channel's environment.
    pub(crate) fn spawn(
        channel: &ProcessChannel,
        error_hook: TransportErrorHook,
    ) -> ProtocolResult<Self> {
        let mut child = Command::new(&channel.command)
            .args(&channel.args)
            .env_clear()
            .envs(&channel.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| {
                ProtocolError::Transport(format!("failed to spawn '{}': {err}", channel.command))
            })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ProtocolError::transport("server stdin is unavailable"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ProtocolError::transport("server stdout is unavailable"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ProtocolError::transport("server stderr is unavailable"))?;

        let stdin = Arc::new(Mutex::new(stdin));
        let pending = PendingRequests::default();
        let closing = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_responses(
            stdout,
            Arc::clone(&stdin),
            pending.clone(),
            Arc::clone(&closing),
            error_hook,
        ));
        let stderr_forwarder = tokio::spawn(forward_stderr(stderr));
        debug!(command = %channel.command, "spawned MCP server process");

        Ok(Self {
            child,
            stdin,
            pending,
            next_id: AtomicU64::new(1),
            closing,
            reader,
            stderr_forwarder,
        })
    }

    async fn write_message<T: Serialize + Sync>(&self, message: &T) -> ProtocolResult<()> {
        let mut stdin = self.stdin.lock().await;
        write_line(&mut *stdin, message).await
    }
}

#[async_trait]
impl RpcConnection for StdioConnection {
    async fn request(&self, method: &str, params: Option<Value>) -> ProtocolResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let receiver = self.pending.register(id).await;

        if let Err(err) = self
            .write_message(&RpcRequest::new(id, method, params))
            .await
        {
            self.pending.forget(id).await;
            return Err(err);
        }

        self.pending.wait(id, method, receiver).await
    }

    async fn notify(&self, method: &str, params: Option<Value>) -> ProtocolResult<()> {
        self.write_message(&RpcNotification::new(method, params))
            .await
    }

    async fn shutdown(&mut self) -> ProtocolResult<()> {
        self.closing.store(true, Ordering::SeqCst);
        if let Err(err) = self.stdin.lock().await.shutdown().await {
            debug!(error = %err, "server stdin already closed");
        }
        let stopped = self.child.kill().await;
        self.reader.abort();
        self.stderr_forwarder.abort();
        self.pending.clear().await;
        stopped.map_err(|err| {
            ProtocolError::Transport(format!("failed to stop server process: {err}"))
        })
    }
}

async fn read_responses(
    stdout: ChildStdout,
    stdin: SharedStdin,
    pending: PendingRequests,
    closing: Arc<AtomicBool>,
    error_hook: TransportErrorHook,
) {
    let mut lines = BufReader::new(stdout).lines();
    let fault = loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let Some(reply) = pending.route(&line).await else {
                    continue;
                };
                let mut writer = stdin.lock().await;
                if let Err(err) = write_line(&mut *writer, &reply).await {
                    debug!(error = %err, "failed to answer server request");
                }
            }
            Ok(None) => break "server closed its output stream".to_owned(),
            Err(err) => break format!("failed to read server output: {err}"),
        }
    };
    pending.clear().await;
    if !closing.load(Ordering::SeqCst) {
        error_hook(&fault);
    }
}

async fn write_line<W, T>(writer: &mut W, message: &T) -> ProtocolResult<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize + Sync,
{
    let mut line = serde_json::to_string(message)
        .map_err(|err| ProtocolError::MalformedResponse(err.to_string()))?;
    line.push('\n');
    writer
        .write_all(line.as_bytes())
        .await
        .map_err(ProtocolError::transport)?;
    writer.flush().await.map_err(ProtocolError::transport)
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        debug!(output = %line, "MCP server stderr");
    }
}
