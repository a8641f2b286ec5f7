//! Transport channels ready to be opened by a protocol client.
//!
//! A channel is plain data plus an error hook. Building one never performs
//! I/O; the protocol client opens it during `connect`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Callback receiving asynchronous transport faults such as a broken pipe.
pub type TransportErrorHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Process to spawn, with its fully merged environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessChannel {
    /// Executable command.
    pub command: String,
    /// Command-line arguments.
    pub args: Vec<String>,
    /// Complete environment of the child; nothing else is inherited.
    pub env: BTreeMap<String, String>,
}

/// Remote endpoint with the headers sent on every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkChannel {
    /// Endpoint URL.
    pub url: String,
    /// Extra request headers.
    pub headers: BTreeMap<String, String>,
}

/// Where a channel leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelTarget {
    /// Local process over STDIO.
    Process(ProcessChannel),
    /// Remote endpoint over HTTP.
    Network(NetworkChannel),
}

/// Unopened communication channel.
#[derive(Clone)]
pub struct TransportChannel {
    target: ChannelTarget,
    error_hook: TransportErrorHook,
}

impl TransportChannel {
    /// Creates a channel reporting faults to `error_hook`.
    #[must_use]
    pub fn new(target: ChannelTarget, error_hook: TransportErrorHook) -> Self {
        Self { target, error_hook }
    }

    /// Returns the channel target.
    #[must_use]
    pub const fn target(&self) -> &ChannelTarget {
        &self.target
    }

    /// Returns a handle to the error hook for background tasks.
    #[must_use]
    pub fn error_hook(&self) -> TransportErrorHook {
        Arc::clone(&self.error_hook)
    }

    /// Reports an asynchronous transport fault.
    pub fn report_fault(&self, fault: &str) {
        (self.error_hook)(fault);
    }
}

impl fmt::Debug for TransportChannel {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("TransportChannel")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}
