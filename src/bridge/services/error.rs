//! Uniform failure surfaced to the host.

use crate::bridge::{domain::BridgeDomainError, ports::ProtocolError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Result type for bridge service operations.
pub type BridgeResult<T> = Result<T, BridgeError>;

/// Service-level errors for capability discovery and dispatch.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum BridgeError {
    /// Transport or handshake failure.
    #[error("failed to connect to MCP server: {message}")]
    Connection {
        /// Failure detail.
        message: String,
    },

    /// Malformed or missing parameters or settings.
    #[error("{message}")]
    Validation {
        /// Capability whose parameters were rejected, when known.
        capability: Option<String>,
        /// Failure detail.
        message: String,
    },

    /// The server rejected or failed an underlying call.
    #[error("failed to execute '{target}': {message}")]
    Call {
        /// Public capability name, URI, or listing the call was made for.
        target: String,
        /// Failure detail from the server.
        message: String,
        /// Structured description derived from the error payload.
        description: Option<String>,
    },

    /// The host requested an operation this bridge does not know.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl BridgeError {
    /// Creates a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a validation error not tied to a capability.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            capability: None,
            message: message.into(),
        }
    }

    /// Creates a validation error naming the offending capability.
    pub fn invalid_parameters(capability: &str, message: impl Into<String>) -> Self {
        Self::Validation {
            capability: Some(capability.to_owned()),
            message: message.into(),
        }
    }

    /// Wraps a protocol failure for `target`.
    #[must_use]
    pub fn call(target: &str, err: &ProtocolError) -> Self {
        Self::Call {
            target: target.to_owned(),
            message: err.to_string(),
            description: describe_error_data(err.data()),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Connection { .. } => FailureKind::Connection,
            Self::Validation { .. } => FailureKind::Validation,
            Self::Call { .. } => FailureKind::Call,
            Self::UnsupportedOperation(_) => FailureKind::UnsupportedOperation,
        }
    }

    /// Returns the structured description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        match self {
            Self::Call { description, .. } => description.as_deref(),
            _ => None,
        }
    }

    /// Renders the serialisable record handed to the host.
    #[must_use]
    pub fn to_failure(&self) -> HostFailure {
        HostFailure {
            kind: self.kind(),
            message: self.to_string(),
            description: self.description().map(str::to_owned),
        }
    }
}

impl From<BridgeDomainError> for BridgeError {
    fn from(err: BridgeDomainError) -> Self {
        Self::validation(err.to_string())
    }
}

/// Renders a protocol error payload as a description string.
///
/// Strings pass through; structured values are JSON-encoded.
#[must_use]
pub fn describe_error_data(data: Option<&Value>) -> Option<String> {
    match data? {
        Value::String(text) => Some(text.clone()),
        other => Some(other.to_string()),
    }
}

/// Failure category exposed to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport or handshake failure.
    Connection,
    /// Parameter or settings validation failure.
    Validation,
    /// Underlying call rejected by the server.
    Call,
    /// Unknown requested operation.
    UnsupportedOperation,
}

impl FailureKind {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Validation => "validation",
            Self::Call => "call",
            Self::UnsupportedOperation => "unsupported_operation",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Failure record consumed by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Human-readable message.
    pub message: String,
    /// Structured description, when the server supplied one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}
