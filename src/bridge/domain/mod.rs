//! Domain model for capability discovery and dispatch.
//!
//! The bridge domain models connection profiles and channels, capability
//! kinds and their public naming convention, coerced parameter schemas,
//! capability records and the per-session registry, and invocation
//! requests and results. Protocol I/O remains outside this boundary.

mod capability;
mod channel;
mod error;
mod kind;
mod lifecycle;
mod listing;
mod params;
mod profile;
mod registry;
mod result;
mod schema;
mod template;

pub use capability::{Capability, CapabilityDescriptor, CapabilityMetadata, URI_PARAMETER};
pub use channel::{
    ChannelTarget, NetworkChannel, ProcessChannel, TransportChannel, TransportErrorHook,
};
pub use error::{
    BridgeDomainError, ParameterParseError, ParameterValidationError, ParseCapabilityKindError,
    ParseTransportKindError,
};
pub use kind::CapabilityKind;
pub use lifecycle::ConnectionState;
pub use listing::{
    PromptArgument, PromptListing, ResourceListing, ResourceTemplateListing, ToolListing,
};
pub use params::{InvocationRequest, RawParameters};
pub use profile::{
    AmbientEnvironment, ClientInfo, ConnectionProfile, DEFAULT_AMBIENT_PREFIX, NetworkProfile,
    PATH_VARIABLE, ProcessProfile, TransportKind, parse_env_pairs, parse_header_lines,
};
pub use registry::{CapabilityRegistry, Resolution};
pub use result::{InvocationResult, JSON_MIME_TYPE, RAW_RESULT_FIELD};
pub use schema::{JSON_SCHEMA_DIALECT, ParameterKind, ParameterSchema, ParameterSpec};
pub use template::uri_matches_template;
