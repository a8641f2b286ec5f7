//! Error types for capability bridge domain validation and parsing.

use super::ParameterKind;
use thiserror::Error;

/// Errors returned while constructing capability bridge domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeDomainError {
    /// The process command is empty after trimming.
    #[error("process command must not be empty")]
    EmptyProcessCommand,

    /// The network URL is empty after trimming.
    #[error("network URL must not be empty")]
    EmptyNetworkUrl,

    /// The network URL does not have an `http://` or `https://` prefix.
    #[error("network URL '{0}' must start with 'http://' or 'https://'")]
    InvalidNetworkUrl(String),

    /// The selected connection type has no credentials configured.
    #[error("no {0} credentials configured for the selected connection type")]
    MissingCredentials(String),

    /// Transitioning between two connection states is invalid.
    #[error("invalid connection state transition: {from} -> {to}")]
    InvalidConnectionTransition {
        /// Current connection state.
        from: String,
        /// Requested target connection state.
        to: String,
    },
}

/// Errors returned while validating arguments against a parameter schema.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParameterValidationError {
    /// A required parameter is absent.
    #[error("parameter '{0}' is required")]
    MissingRequired(String),

    /// A parameter value does not match its declared kind.
    #[error("parameter '{name}' must be of type {expected}")]
    TypeMismatch {
        /// Parameter name.
        name: String,
        /// Declared parameter kind.
        expected: ParameterKind,
    },
}

/// Errors returned while turning raw host parameters into an argument object.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParameterParseError {
    /// The parameter text is not valid JSON.
    #[error("parameters are not valid JSON: {0}")]
    InvalidJson(String),

    /// The parameters decoded to a non-empty value that is not an object.
    #[error("parameters must be a JSON object")]
    NotAnObject,
}

/// Error returned while parsing a capability kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown capability kind: {0}")]
pub struct ParseCapabilityKindError(pub String);

/// Error returned while parsing a transport kind.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown connection type: {0}")]
pub struct ParseTransportKindError(pub String);
