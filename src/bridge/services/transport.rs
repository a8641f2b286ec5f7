//! Transport factory turning connection profiles into channels.

use crate::bridge::domain::{
    AmbientEnvironment, ChannelTarget, ConnectionProfile, NetworkChannel, NetworkProfile,
    PATH_VARIABLE, ProcessChannel, ProcessProfile, TransportChannel, TransportErrorHook,
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Builds transport channels from connection profiles.
///
/// Building performs no I/O.
#[derive(Clone)]
pub struct TransportFactory {
    ambient: AmbientEnvironment,
    error_hook: TransportErrorHook,
}

impl TransportFactory {
    /// Creates a factory whose channels log transport faults.
    #[must_use]
    pub fn new(ambient: AmbientEnvironment) -> Self {
        Self {
            ambient,
            error_hook: Arc::new(log_transport_fault),
        }
    }

    /// Replaces the hook receiving asynchronous transport faults.
    #[must_use]
    pub fn with_error_hook(mut self, error_hook: TransportErrorHook) -> Self {
        self.error_hook = error_hook;
        self
    }

    /// Returns the ambient environment snapshot.
    #[must_use]
    pub const fn ambient(&self) -> &AmbientEnvironment {
        &self.ambient
    }

    /// Builds an unopened channel for `profile`.
    #[must_use]
    pub fn build(&self, profile: &ConnectionProfile) -> TransportChannel {
        let target = match profile {
            ConnectionProfile::Process(process) => ChannelTarget::Process(self.process(process)),
            ConnectionProfile::Network(network) => ChannelTarget::Network(Self::network(network)),
        };
        TransportChannel::new(target, Arc::clone(&self.error_hook))
    }

    /// Merges the child environment: inherited `PATH`, then explicit
    /// overrides, then forwarded ambient variables.
    fn process(&self, profile: &ProcessProfile) -> ProcessChannel {
        let mut env = std::collections::BTreeMap::new();
        env.insert(
            PATH_VARIABLE.to_owned(),
            self.ambient.path().unwrap_or_default().to_owned(),
        );
        env.extend(
            profile
                .env_overrides()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );
        env.extend(
            self.ambient
                .forwarded()
                .iter()
                .map(|(name, value)| (name.clone(), value.clone())),
        );

        debug!(command = profile.command(), "created STDIO transport for MCP client");
        ProcessChannel {
            command: profile.command().to_owned(),
            args: profile.args().to_vec(),
            env,
        }
    }

    fn network(profile: &NetworkProfile) -> NetworkChannel {
        debug!(url = profile.url(), "created network transport for MCP client");
        if let Some(endpoint) = profile.alternate_submit_endpoint() {
            warn!(
                endpoint,
                "custom messages endpoint provided but not supported by the network transport"
            );
        }
        NetworkChannel {
            url: profile.url().to_owned(),
            headers: profile.headers().clone(),
        }
    }
}

impl std::fmt::Debug for TransportFactory {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TransportFactory")
            .field("ambient", &self.ambient)
            .finish_non_exhaustive()
    }
}

fn log_transport_fault(fault: &str) {
    error!(fault, "MCP transport error");
}
