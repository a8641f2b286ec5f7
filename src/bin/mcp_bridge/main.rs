//! Runs one capability bridge operation against an MCP server.
//!
//! Usage:
//!
//! ```text
//! mcp_bridge <operation> <request-path>
//! ```
//!
//! The `operation` is any host operation name such as `discoverCapabilities`
//! or `executeTool`. The JSON document at `request-path` must deserialize to
//! a [`BridgeRequest`]. A representative request is:
//!
//! ```json
//! {
//!   "settings": {
//!     "connectionType": "cmd",
//!     "process": {
//!       "command": "npx",
//!       "args": "-y @modelcontextprotocol/server-everything",
//!       "environments": "DEBUG=1"
//!     }
//!   },
//!   "parameters": {
//!     "toolName": "echo",
//!     "toolParameters": "{\"message\":\"hi\"}"
//!   }
//! }
//! ```
//!
//! The operation result is written to stdout as JSON. Failures are written
//! as a host failure record and the process exits with status 1. Logs go to
//! stderr and honour `RUST_LOG`.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use capability_bridge::bridge::{
    adapters::JsonRpcClientProvider,
    config::{BridgeConfig, OperationParameters},
    services::{BridgeError, BridgeOperation, CapabilityBridge},
};
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::io::{self, Write};
use std::process::ExitCode;
use thiserror::Error;
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

/// Settings and parameters for one invocation.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BridgeRequest {
    settings: BridgeConfig,
    parameters: OperationParameters,
}

/// Errors raised before an operation reaches the bridge.
#[derive(Debug, Error)]
enum InvocationError {
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),
    #[error("failed to read request: {0}")]
    RequestRead(#[source] io::Error),
    #[error("failed to parse request: {0}")]
    RequestParse(#[source] serde_json::Error),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

fn main() -> ExitCode {
    init_logging();
    let outcome = collect_args().and_then(|args| run(args.into_iter()));
    let (document, code) = match outcome {
        Ok(payload) => (payload, ExitCode::SUCCESS),
        Err(err) => {
            tracing::error!(error = %err, "bridge invocation failed");
            (failure_document(&err), ExitCode::FAILURE)
        }
    };
    match write_document(&document) {
        Ok(()) => code,
        Err(err) => {
            tracing::error!(error = %err, "failed to write result");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn collect_args() -> Result<Vec<Utf8PathBuf>, InvocationError> {
    env::args_os()
        .map(|arg_os| {
            let arg = arg_os.into_string().map_err(|_| {
                InvocationError::InvalidArgs("argument is not valid UTF-8".to_owned())
            })?;
            Ok(Utf8PathBuf::from(arg))
        })
        .collect()
}

fn run(args: impl Iterator<Item = Utf8PathBuf>) -> Result<Value, InvocationError> {
    let (operation_name, request_path) = parse_args(args)?;
    let request = load_request(&request_path)?;
    let profile = request
        .settings
        .connection_profile()
        .map_err(BridgeError::from)?;
    let operation = BridgeOperation::from_host(&operation_name, request.parameters)?;
    let provider = JsonRpcClientProvider::new(request.settings.client_info.clone());
    let bridge = CapabilityBridge::from_config(provider, &request.settings);

    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(InvocationError::RuntimeInit)?;
    Ok(runtime.block_on(bridge.invoke(&profile, operation))?)
}

fn parse_args(
    mut args: impl Iterator<Item = Utf8PathBuf>,
) -> Result<(String, Utf8PathBuf), InvocationError> {
    let _program = args.next();
    let operation = args
        .next()
        .ok_or_else(|| InvocationError::InvalidArgs("missing operation argument".to_owned()))?;
    let request_path = args
        .next()
        .ok_or_else(|| InvocationError::InvalidArgs("missing request path argument".to_owned()))?;
    if let Some(extra) = args.next() {
        return Err(InvocationError::InvalidArgs(format!(
            "unexpected extra argument: {extra}"
        )));
    }
    Ok((operation.into_string(), request_path))
}

fn load_request(path: &Utf8Path) -> Result<BridgeRequest, InvocationError> {
    let text = read_request_file(path).map_err(InvocationError::RequestRead)?;
    parse_request(&text)
}

fn parse_request(text: &str) -> Result<BridgeRequest, InvocationError> {
    serde_json::from_str(text).map_err(InvocationError::RequestParse)
}

fn read_request_file(path: &Utf8Path) -> io::Result<String> {
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("request path '{path}' has no file name")))?;
    let parent = match path.parent() {
        Some(dir) if !dir.as_str().is_empty() => dir,
        _ => Utf8Path::new("."),
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read_to_string(file_name)
}

fn failure_document(err: &InvocationError) -> Value {
    let failure = match err {
        InvocationError::Bridge(bridge_err) => bridge_err.to_failure(),
        other => BridgeError::validation(other.to_string()).to_failure(),
    };
    serde_json::to_value(failure).unwrap_or(Value::Null)
}

fn write_document(document: &Value) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, document).map_err(io::Error::other)?;
    writeln!(stdout)?;
    stdout.flush()
}
