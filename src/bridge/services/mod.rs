//! Application services for capability discovery and dispatch.

mod bridge;
mod connection;
mod discovery;
mod dispatch;
mod error;
mod normalize;
mod transport;

pub use bridge::{BridgeOperation, CapabilityBridge};
pub use connection::ConnectionManager;
pub use discovery::discover_capabilities;
pub use dispatch::ExecutionDispatcher;
pub use error::{BridgeError, BridgeResult, FailureKind, HostFailure, describe_error_data};
pub use normalize::normalize_result;
pub use transport::TransportFactory;
