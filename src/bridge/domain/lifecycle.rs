//! Connection lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one protocol connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection attempt yet.
    #[default]
    Disconnected,
    /// Handshake in progress.
    Connecting,
    /// Ready for calls.
    Connected,
    /// Shutdown in progress.
    Closing,
    /// Released; terminal.
    Closed,
}

impl ConnectionState {
    /// Returns the canonical string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Closing => "closing",
            Self::Closed => "closed",
        }
    }

    /// Returns whether calls may be issued.
    #[must_use]
    pub const fn is_open(self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Returns whether transition to `target` is allowed.
    ///
    /// A failed handshake goes straight from `Connecting` to `Closed`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Disconnected, Self::Connecting | Self::Closed)
                | (Self::Connecting, Self::Connected | Self::Closed)
                | (Self::Connected, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}
