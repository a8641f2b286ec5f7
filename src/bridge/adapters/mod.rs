//! Adapter implementations for the protocol client port.

pub mod jsonrpc;
pub mod memory;

pub use jsonrpc::{JsonRpcClientProvider, JsonRpcProtocolClient, PROTOCOL_VERSION};
pub use memory::{InMemoryProtocolClient, RecordedCall};
