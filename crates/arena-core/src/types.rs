//! Shared types used across Agent Arena crates.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identity record a validated agent must return from its identity
/// endpoint.
///
/// The wire format uses PascalCase keys: `{"Owner": "btc", "Taunts":
/// ["gg"]}`. The record is only used to confirm protocol compliance;
/// it is never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentIdentity {
    /// Owner identifier for the agent.
    pub owner: String,
    /// Display strings the agent may show during play.
    pub taunts: Vec<String>,
}

/// Host-side network endpoint a container's service port was mapped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Host address the runtime bound the mapping to.
    pub host: String,
    /// Ephemeral host port.
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
