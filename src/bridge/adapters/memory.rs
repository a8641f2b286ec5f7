//! In-memory protocol client adapter for bridge tests.

use crate::bridge::{
    domain::{
        CapabilityKind, ChannelTarget, PromptListing, ResourceListing, ResourceTemplateListing,
        ToolListing, TransportChannel,
    },
    ports::{ClientProvider, ProtocolClient, ProtocolError, ProtocolResult},
};
use async_trait::async_trait;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;
const RESOURCE_NOT_FOUND: i64 = -32002;

/// Protocol call observed by the in-memory server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// `tools/call`.
    CallTool {
        /// Tool name.
        name: String,
        /// Argument object as sent.
        arguments: Map<String, Value>,
    },
    /// `resources/read`.
    ReadResource {
        /// Resource URI.
        uri: String,
    },
    /// `prompts/get`.
    GetPrompt {
        /// Prompt name.
        name: String,
    },
}

/// Scripted MCP server reachable without any transport.
///
/// Clients created through [`ClientProvider::new_client`] share the scripted
/// catalog and the call log, but each tracks its own connection.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProtocolClient {
    state: Arc<RwLock<InMemoryServerState>>,
    connected: bool,
}

#[derive(Debug, Default)]
struct InMemoryServerState {
    tools: Vec<ToolListing>,
    resources: Vec<ResourceListing>,
    resource_templates: Vec<ResourceTemplateListing>,
    prompts: Vec<PromptListing>,
    listing_failures: BTreeMap<CapabilityKind, String>,
    tool_results: BTreeMap<String, Value>,
    resource_contents: BTreeMap<String, Value>,
    prompt_results: BTreeMap<String, Value>,
    call_failures: BTreeMap<String, ProtocolError>,
    connect_failure: Option<String>,
    close_failure: Option<String>,
    channels: Vec<ChannelTarget>,
    calls: Vec<RecordedCall>,
    close_count: usize,
}

impl InMemoryProtocolClient {
    /// Creates a server with empty catalogs.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the tool catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn set_tools(&self, tools: Vec<ToolListing>) -> ProtocolResult<()> {
        self.write_state()?.tools = tools;
        Ok(())
    }

    /// Replaces the resource catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn set_resources(&self, resources: Vec<ResourceListing>) -> ProtocolResult<()> {
        self.write_state()?.resources = resources;
        Ok(())
    }

    /// Replaces the resource template catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn set_resource_templates(
        &self,
        templates: Vec<ResourceTemplateListing>,
    ) -> ProtocolResult<()> {
        self.write_state()?.resource_templates = templates;
        Ok(())
    }

    /// Replaces the prompt catalog.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn set_prompts(&self, prompts: Vec<PromptListing>) -> ProtocolResult<()> {
        self.write_state()?.prompts = prompts;
        Ok(())
    }

    /// Makes listing `kind` fail with an internal JSON-RPC error.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn fail_listing(
        &self,
        kind: CapabilityKind,
        message: impl Into<String>,
    ) -> ProtocolResult<()> {
        self.write_state()?
            .listing_failures
            .insert(kind, message.into());
        Ok(())
    }

    /// Scripts the raw result of calling tool `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn set_tool_result(&self, name: impl Into<String>, result: Value) -> ProtocolResult<()> {
        self.write_state()?.tool_results.insert(name.into(), result);
        Ok(())
    }

    /// Scripts the raw result of reading `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn set_resource_content(&self, uri: impl Into<String>, result: Value) -> ProtocolResult<()> {
        self.write_state()?
            .resource_contents
            .insert(uri.into(), result);
        Ok(())
    }

    /// Scripts the raw result of fetching prompt `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn set_prompt_result(&self, name: impl Into<String>, result: Value) -> ProtocolResult<()> {
        self.write_state()?.prompt_results.insert(name.into(), result);
        Ok(())
    }

    /// Makes any call addressed to `identifier` fail with `error`.
    ///
    /// The identifier is a tool name, resource URI, or prompt name.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn fail_call(
        &self,
        identifier: impl Into<String>,
        error: ProtocolError,
    ) -> ProtocolResult<()> {
        self.write_state()?
            .call_failures
            .insert(identifier.into(), error);
        Ok(())
    }

    /// Makes every subsequent handshake fail.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn fail_connect(&self, message: impl Into<String>) -> ProtocolResult<()> {
        self.write_state()?.connect_failure = Some(message.into());
        Ok(())
    }

    /// Makes every subsequent close fail.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn fail_close(&self, message: impl Into<String>) -> ProtocolResult<()> {
        self.write_state()?.close_failure = Some(message.into());
        Ok(())
    }

    /// Returns the calls made so far, in order.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn calls(&self) -> ProtocolResult<Vec<RecordedCall>> {
        Ok(self.read_state()?.calls.clone())
    }

    /// Returns the channel targets every client was asked to open.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn channels(&self) -> ProtocolResult<Vec<ChannelTarget>> {
        Ok(self.read_state()?.channels.clone())
    }

    /// Returns how many connections were attempted.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn connect_count(&self) -> ProtocolResult<usize> {
        Ok(self.read_state()?.channels.len())
    }

    /// Returns how many times a client was closed.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Transport`] when lock acquisition fails.
    pub fn close_count(&self) -> ProtocolResult<usize> {
        Ok(self.read_state()?.close_count)
    }

    /// Reports whether this client holds an open connection.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    fn read_state(&self) -> ProtocolResult<RwLockReadGuard<'_, InMemoryServerState>> {
        self.state.read().map_err(ProtocolError::transport)
    }

    fn write_state(&self) -> ProtocolResult<RwLockWriteGuard<'_, InMemoryServerState>> {
        self.state.write().map_err(ProtocolError::transport)
    }

    fn ensure_connected(&self) -> ProtocolResult<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ProtocolError::NotConnected)
        }
    }

    fn listing<T: Clone>(
        &self,
        kind: CapabilityKind,
        select: impl FnOnce(&InMemoryServerState) -> &Vec<T>,
    ) -> ProtocolResult<Vec<T>> {
        self.ensure_connected()?;
        let state = self.read_state()?;
        if let Some(message) = state.listing_failures.get(&kind) {
            return Err(ProtocolError::rpc(INTERNAL_ERROR, message.clone()));
        }
        Ok(select(&state).clone())
    }

    fn record(&self, identifier: &str, call: RecordedCall) -> ProtocolResult<()> {
        self.ensure_connected()?;
        let mut state = self.write_state()?;
        state.calls.push(call);
        match state.call_failures.get(identifier) {
            Some(failure) => Err(failure.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ProtocolClient for InMemoryProtocolClient {
    async fn connect(&mut self, channel: TransportChannel) -> ProtocolResult<()> {
        let mut state = self.write_state()?;
        state.channels.push(channel.target().clone());
        if let Some(message) = &state.connect_failure {
            return Err(ProtocolError::Transport(message.clone()));
        }
        drop(state);
        self.connected = true;
        Ok(())
    }

    async fn close(&mut self) -> ProtocolResult<()> {
        self.connected = false;
        let mut state = self.write_state()?;
        state.close_count += 1;
        match &state.close_failure {
            Some(message) => Err(ProtocolError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    async fn list_tools(&self) -> ProtocolResult<Vec<ToolListing>> {
        self.listing(CapabilityKind::Tool, |state| &state.tools)
    }

    async fn list_resources(&self) -> ProtocolResult<Vec<ResourceListing>> {
        self.listing(CapabilityKind::Resource, |state| &state.resources)
    }

    async fn list_resource_templates(&self) -> ProtocolResult<Vec<ResourceTemplateListing>> {
        self.listing(CapabilityKind::ResourceTemplate, |state| {
            &state.resource_templates
        })
    }

    async fn list_prompts(&self) -> ProtocolResult<Vec<PromptListing>> {
        self.listing(CapabilityKind::Prompt, |state| &state.prompts)
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> ProtocolResult<Value> {
        self.record(
            name,
            RecordedCall::CallTool {
                name: name.to_owned(),
                arguments,
            },
        )?;
        let state = self.read_state()?;
        if let Some(result) = state.tool_results.get(name) {
            return Ok(result.clone());
        }
        if state.tools.iter().any(|tool| tool.name == name) {
            return Ok(json!({ "content": [] }));
        }
        Err(ProtocolError::rpc(
            INVALID_PARAMS,
            format!("Unknown tool: {name}"),
        ))
    }

    async fn read_resource(&self, uri: &str) -> ProtocolResult<Value> {
        self.record(
            uri,
            RecordedCall::ReadResource {
                uri: uri.to_owned(),
            },
        )?;
        self.read_state()?
            .resource_contents
            .get(uri)
            .cloned()
            .ok_or_else(|| {
                ProtocolError::rpc(RESOURCE_NOT_FOUND, "Resource not found")
                    .with_data(json!({ "uri": uri }))
            })
    }

    async fn get_prompt(&self, name: &str) -> ProtocolResult<Value> {
        self.record(
            name,
            RecordedCall::GetPrompt {
                name: name.to_owned(),
            },
        )?;
        self.read_state()?
            .prompt_results
            .get(name)
            .cloned()
            .ok_or_else(|| ProtocolError::rpc(INVALID_PARAMS, format!("Unknown prompt: {name}")))
    }
}

impl ClientProvider for InMemoryProtocolClient {
    type Client = Self;

    fn new_client(&self) -> Self::Client {
        Self {
            state: Arc::clone(&self.state),
            connected: false,
        }
    }
}
