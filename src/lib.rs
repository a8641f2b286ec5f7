//! Capability bridge: MCP servers exposed as flat, uniformly named tools.
//!
//! Hosts that only understand "call a named tool with a JSON object" use
//! this crate to reach everything an MCP server offers. Tools, resources,
//! prompts, and resource templates are discovered concurrently and published
//! under one naming convention, and every invocation is routed back to the
//! matching protocol call.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Capability records, naming, schemas, and connection profiles
//! - **Ports**: The async protocol client contract
//! - **Adapters**: JSON-RPC over STDIO or HTTP, and an in-memory server
//! - **Services**: Connection lifecycle, discovery, dispatch, and host operations
//!
//! # Modules
//!
//! - [`bridge`]: Discovery and dispatch of MCP capabilities

pub mod bridge;
