//! Connection profiles and the credential-string formats they are built from.

use super::{BridgeDomainError, ParseTransportKindError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix marking ambient variables forwarded to spawned servers.
pub const DEFAULT_AMBIENT_PREFIX: &str = "MCP_";

/// Name of the search-path variable inherited by spawned servers.
pub const PATH_VARIABLE: &str = "PATH";

/// Transport selected by the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Local process over STDIO.
    #[default]
    Cmd,
    /// Remote endpoint over HTTP.
    Sse,
}

impl TransportKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cmd => "cmd",
            Self::Sse => "sse",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TransportKind {
    type Error = ParseTransportKindError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "cmd" | "stdio" => Ok(Self::Cmd),
            "sse" | "http" => Ok(Self::Sse),
            _ => Err(ParseTransportKindError(value.to_owned())),
        }
    }
}

/// Settings for an MCP server spawned as a local process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessProfile {
    command: String,
    args: Vec<String>,
    env_overrides: BTreeMap<String, String>,
}

impl ProcessProfile {
    /// Creates a process profile.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::EmptyProcessCommand`] when `command` is
    /// empty after trimming.
    pub fn new(command: impl Into<String>) -> Result<Self, BridgeDomainError> {
        let normalized_command = command.into().trim().to_owned();
        if normalized_command.is_empty() {
            return Err(BridgeDomainError::EmptyProcessCommand);
        }

        Ok(Self {
            command: normalized_command,
            args: Vec::new(),
            env_overrides: BTreeMap::new(),
        })
    }

    /// Replaces command-line arguments.
    #[must_use]
    pub fn with_args(mut self, values: impl IntoIterator<Item = String>) -> Self {
        self.args = values.into_iter().collect();
        self
    }

    /// Replaces command-line arguments with the space-separated words of
    /// `line`.
    #[must_use]
    pub fn with_args_line(self, line: &str) -> Self {
        self.with_args(
            line.split(' ')
                .filter(|arg| !arg.is_empty())
                .map(str::to_owned),
        )
    }

    /// Replaces environment overrides.
    #[must_use]
    pub fn with_env_overrides(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.env_overrides = values.into_iter().collect();
        self
    }

    /// Replaces environment overrides with pairs parsed by
    /// [`parse_env_pairs`].
    #[must_use]
    pub fn with_env_pairs(self, raw: &str) -> Self {
        self.with_env_overrides(parse_env_pairs(raw))
    }

    /// Returns the executable command.
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Returns command-line arguments.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns explicit environment overrides.
    #[must_use]
    pub const fn env_overrides(&self) -> &BTreeMap<String, String> {
        &self.env_overrides
    }
}

/// Settings for an MCP server reached over the network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkProfile {
    url: String,
    headers: BTreeMap<String, String>,
    alternate_submit_endpoint: Option<String>,
}

impl NetworkProfile {
    /// Creates a network profile.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError`] when `url` is empty or does not start
    /// with `http://` or `https://`.
    pub fn new(url: impl Into<String>) -> Result<Self, BridgeDomainError> {
        let normalized_url = url.into().trim().to_owned();
        if normalized_url.is_empty() {
            return Err(BridgeDomainError::EmptyNetworkUrl);
        }

        let has_valid_prefix =
            normalized_url.starts_with("http://") || normalized_url.starts_with("https://");
        if !has_valid_prefix {
            return Err(BridgeDomainError::InvalidNetworkUrl(normalized_url));
        }

        Ok(Self {
            url: normalized_url,
            headers: BTreeMap::new(),
            alternate_submit_endpoint: None,
        })
    }

    /// Replaces extra request headers.
    #[must_use]
    pub fn with_headers(mut self, values: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers = values.into_iter().collect();
        self
    }

    /// Replaces extra request headers with lines parsed by
    /// [`parse_header_lines`].
    #[must_use]
    pub fn with_header_lines(self, raw: &str) -> Self {
        self.with_headers(parse_header_lines(raw))
    }

    /// Records an alternate message-submit endpoint.
    ///
    /// Blank values are ignored.
    #[must_use]
    pub fn with_alternate_submit_endpoint(mut self, value: &str) -> Self {
        let normalized = value.trim();
        self.alternate_submit_endpoint = (!normalized.is_empty()).then(|| normalized.to_owned());
        self
    }

    /// Returns the endpoint URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns extra request headers.
    #[must_use]
    pub const fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    /// Returns the alternate message-submit endpoint, if configured.
    #[must_use]
    pub fn alternate_submit_endpoint(&self) -> Option<&str> {
        self.alternate_submit_endpoint.as_deref()
    }
}

/// How to reach an MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "config")]
pub enum ConnectionProfile {
    /// Spawn a local process and talk over STDIO.
    Process(ProcessProfile),
    /// Talk to a remote endpoint.
    Network(NetworkProfile),
}

impl ConnectionProfile {
    /// Creates a process profile.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`ProcessProfile::new`].
    pub fn process(command: impl Into<String>) -> Result<Self, BridgeDomainError> {
        Ok(Self::Process(ProcessProfile::new(command)?))
    }

    /// Creates a network profile.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`NetworkProfile::new`].
    pub fn network(url: impl Into<String>) -> Result<Self, BridgeDomainError> {
        Ok(Self::Network(NetworkProfile::new(url)?))
    }

    /// Returns the transport kind this profile uses.
    #[must_use]
    pub const fn transport_kind(&self) -> TransportKind {
        match self {
            Self::Process(_) => TransportKind::Cmd,
            Self::Network(_) => TransportKind::Sse,
        }
    }
}

/// Parses `NAME=value` pairs separated by commas, newlines, or whitespace.
///
/// Each pair splits on its first `=`. Pairs without `=` or with an empty
/// name are skipped. Later pairs win.
#[must_use]
pub fn parse_env_pairs(raw: &str) -> BTreeMap<String, String> {
    raw.split(|character: char| character == ',' || character.is_whitespace())
        .filter_map(|pair| {
            let (raw_name, raw_value) = pair.split_once('=')?;
            let name = raw_name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_owned(), raw_value.trim().to_owned()))
        })
        .collect()
}

/// Parses newline-separated `Name: Value` header lines.
///
/// Each line splits on its first colon. Lines without a colon, or with an
/// empty name or value after trimming, are skipped.
#[must_use]
pub fn parse_header_lines(raw: &str) -> BTreeMap<String, String> {
    raw.lines()
        .filter_map(|line| {
            let (raw_name, raw_value) = line.split_once(':')?;
            let name = raw_name.trim();
            let value = raw_value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name.to_owned(), value.to_owned()))
        })
        .collect()
}

/// Snapshot of the host environment relevant to spawned servers.
///
/// Prefixed variables are stored with the prefix already stripped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AmbientEnvironment {
    path: Option<String>,
    forwarded: BTreeMap<String, String>,
}

impl AmbientEnvironment {
    /// Captures `PATH` and every non-empty variable starting with `prefix`.
    #[must_use]
    pub fn from_vars(vars: impl IntoIterator<Item = (String, String)>, prefix: &str) -> Self {
        let mut path = None;
        let mut forwarded = BTreeMap::new();
        for (key, value) in vars {
            if key == PATH_VARIABLE {
                path = Some(value.clone());
            }
            if let Some(stripped) = key.strip_prefix(prefix) {
                if !stripped.is_empty() && !value.is_empty() {
                    forwarded.insert(stripped.to_owned(), value);
                }
            }
        }
        Self { path, forwarded }
    }

    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are ignored.
    #[must_use]
    pub fn from_process(prefix: &str) -> Self {
        Self::from_vars(
            std::env::vars_os().filter_map(|(key, value)| {
                Some((key.into_string().ok()?, value.into_string().ok()?))
            }),
            prefix,
        )
    }

    /// Returns the inherited `PATH`.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// Returns forwarded variables keyed by their stripped names.
    #[must_use]
    pub const fn forwarded(&self) -> &BTreeMap<String, String> {
        &self.forwarded
    }
}

/// Identity announced to the server during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Client name.
    pub name: String,
    /// Client version.
    pub version: String,
}

impl ClientInfo {
    /// Creates a client identity.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new(
            concat!(env!("CARGO_PKG_NAME"), "-client"),
            env!("CARGO_PKG_VERSION"),
        )
    }
}
