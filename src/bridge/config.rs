//! Host-facing configuration for the capability bridge.
//!
//! Credentials arrive as the flat strings a host settings form produces:
//! space-separated arguments, `NAME=value` environment pairs, and
//! newline-separated `Name: Value` header lines. [`BridgeConfig`] parses
//! them into a validated [`ConnectionProfile`].

use crate::bridge::domain::{
    AmbientEnvironment, BridgeDomainError, ClientInfo, ConnectionProfile, DEFAULT_AMBIENT_PREFIX,
    NetworkProfile, ProcessProfile, RawParameters, TransportKind,
};
use serde::{Deserialize, Serialize};

/// Bridge settings supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Selected transport.
    pub connection_type: TransportKind,
    /// Credentials for a spawned server.
    pub process: Option<ProcessCredentials>,
    /// Credentials for a remote server.
    pub network: Option<NetworkCredentials>,
    /// Identity announced during the handshake.
    pub client_info: ClientInfo,
    /// Prefix of ambient variables forwarded to spawned servers.
    pub ambient_prefix: String,
    /// Run discovery before `executeTool` so dispatch uses registered
    /// schemas instead of the naming convention alone.
    pub resolve_via_discovery: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            connection_type: TransportKind::default(),
            process: None,
            network: None,
            client_info: ClientInfo::default(),
            ambient_prefix: DEFAULT_AMBIENT_PREFIX.to_owned(),
            resolve_via_discovery: false,
        }
    }
}

impl BridgeConfig {
    /// Builds the connection profile for the selected transport.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::MissingCredentials`] when the selected
    /// transport has no credentials, or the validation error of the profile
    /// constructor.
    pub fn connection_profile(&self) -> Result<ConnectionProfile, BridgeDomainError> {
        match self.connection_type {
            TransportKind::Cmd => {
                let credentials = self
                    .process
                    .as_ref()
                    .ok_or_else(|| BridgeDomainError::MissingCredentials("process".to_owned()))?;
                Ok(ConnectionProfile::Process(credentials.to_profile()?))
            }
            TransportKind::Sse => {
                let credentials = self
                    .network
                    .as_ref()
                    .ok_or_else(|| BridgeDomainError::MissingCredentials("network".to_owned()))?;
                Ok(ConnectionProfile::Network(credentials.to_profile()?))
            }
        }
    }

    /// Captures the ambient environment using the configured prefix.
    #[must_use]
    pub fn ambient_environment(&self) -> AmbientEnvironment {
        AmbientEnvironment::from_process(&self.ambient_prefix)
    }
}

/// Process credentials in host form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessCredentials {
    /// Executable to spawn.
    pub command: String,
    /// Space-separated argument line.
    pub args: Option<String>,
    /// `NAME=value` pairs separated by commas or whitespace.
    pub environments: Option<String>,
}

impl ProcessCredentials {
    /// Parses the credentials into a process profile.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeDomainError::EmptyProcessCommand`] for a blank command.
    pub fn to_profile(&self) -> Result<ProcessProfile, BridgeDomainError> {
        Ok(ProcessProfile::new(self.command.as_str())?
            .with_args_line(self.args.as_deref().unwrap_or_default())
            .with_env_pairs(self.environments.as_deref().unwrap_or_default()))
    }
}

/// Network credentials in host form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NetworkCredentials {
    /// Server URL.
    pub sse_url: String,
    /// Newline-separated `Name: Value` header lines.
    pub headers: Option<String>,
    /// Alternate message-submit endpoint.
    pub messages_post_endpoint: Option<String>,
}

impl NetworkCredentials {
    /// Parses the credentials into a network profile.
    ///
    /// # Errors
    ///
    /// Returns URL validation errors from [`NetworkProfile::new`].
    pub fn to_profile(&self) -> Result<NetworkProfile, BridgeDomainError> {
        Ok(NetworkProfile::new(self.sse_url.as_str())?
            .with_header_lines(self.headers.as_deref().unwrap_or_default())
            .with_alternate_submit_endpoint(
                self.messages_post_endpoint.as_deref().unwrap_or_default(),
            ))
    }
}

/// Per-operation parameters supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperationParameters {
    /// Public capability name for `executeTool`.
    pub tool_name: Option<String>,
    /// Raw parameters for `executeTool`.
    pub tool_parameters: RawParameters,
    /// Resource URI for `readResource`.
    pub resource_uri: Option<String>,
    /// Prompt name for `getPrompt`.
    pub prompt_name: Option<String>,
}
