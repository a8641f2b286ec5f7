//! Connection manager owning one protocol client for one operation.

use super::{BridgeError, BridgeResult};
use crate::bridge::{
    domain::{BridgeDomainError, ConnectionState, TransportChannel},
    ports::ProtocolClient,
};
use tracing::{debug, error, warn};

/// Drives exactly one connect and at most one close of a protocol client.
#[derive(Debug)]
pub struct ConnectionManager<C>
where
    C: ProtocolClient,
{
    client: C,
    state: ConnectionState,
}

impl<C> ConnectionManager<C>
where
    C: ProtocolClient,
{
    /// Wraps an unconnected client.
    #[must_use]
    pub const fn new(client: C) -> Self {
        Self {
            client,
            state: ConnectionState::Disconnected,
        }
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Opens `channel` and performs the handshake.
    ///
    /// On failure the half-open client is closed on a best-effort basis and
    /// the manager ends in [`ConnectionState::Closed`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Connection`] when the handshake fails or the
    /// manager has already been used.
    pub async fn connect(&mut self, channel: TransportChannel) -> BridgeResult<()> {
        self.advance(ConnectionState::Connecting)
            .map_err(|err| BridgeError::connection(err.to_string()))?;

        match self.client.connect(channel).await {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                debug!("MCP client connected");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "MCP client connection failed");
                if let Err(close_err) = self.client.close().await {
                    error!(error = %close_err, "failed to close transport after connection failure");
                }
                self.state = ConnectionState::Closed;
                Err(BridgeError::connection(err.to_string()))
            }
        }
    }

    /// Closes the connection.
    ///
    /// Idempotent and infallible: repeated calls are no-ops and close
    /// failures are logged, never returned.
    pub async fn close(&mut self) {
        match self.state {
            ConnectionState::Connected => {
                self.state = ConnectionState::Closing;
                match self.client.close().await {
                    Ok(()) => debug!("MCP client closed"),
                    Err(err) => error!(error = %err, "error closing MCP client"),
                }
                self.state = ConnectionState::Closed;
            }
            ConnectionState::Disconnected => self.state = ConnectionState::Closed,
            ConnectionState::Connecting | ConnectionState::Closing | ConnectionState::Closed => {}
        }
    }

    /// Returns the connected client.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Connection`] unless the manager is connected.
    pub fn client(&self) -> BridgeResult<&C> {
        if self.state.is_open() {
            Ok(&self.client)
        } else {
            Err(BridgeError::connection(format!(
                "MCP client is not connected (state: {})",
                self.state
            )))
        }
    }

    fn advance(&mut self, target: ConnectionState) -> Result<(), BridgeDomainError> {
        if !self.state.can_transition_to(target) {
            return Err(BridgeDomainError::InvalidConnectionTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        self.state = target;
        Ok(())
    }
}

impl<C> Drop for ConnectionManager<C>
where
    C: ProtocolClient,
{
    fn drop(&mut self) {
        if self.state.is_open() {
            warn!("MCP connection dropped without close; releasing with the client");
        }
    }
}
