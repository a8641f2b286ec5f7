//! Port contracts for MCP capability bridging.

mod client;

pub use client::{ClientProvider, ProtocolClient, ProtocolError, ProtocolResult};

#[cfg(test)]
pub use client::MockProtocolClient;
