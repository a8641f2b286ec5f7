//! MCP capability bridging for hosts that only understand flat tools.
//!
//! This module connects to one MCP server per host operation, discovers its
//! tools, resources, prompts, and resource templates, exposes all of them as
//! uniformly named capabilities, and routes invocations back to the right
//! protocol call. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]
//! - Host settings in [`config`]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
