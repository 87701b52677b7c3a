//! Validation configuration.
//!
//! All knobs are explicit structs handed to the validator's constructor;
//! nothing reads ambient global state.

use std::time::Duration;

/// Retry policy for the health probe.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Delay before the first retry.
    pub initial_interval: Duration,
    /// Upper bound on a single retry delay.
    pub max_interval: Duration,
    /// Wall-clock budget for the whole probe, retries included.
    pub max_elapsed: Duration,
    /// Factor applied to the delay after each transient failure.
    pub multiplier: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            max_elapsed: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

/// Configuration for validating one agent image.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Container port every agent must expose its service on.
    pub service_port: u16,
    /// Path probed for the identity payload.
    pub identity_path: String,
    /// Grace period granted to a container before forced termination.
    pub stop_grace: Duration,
    /// Probe retry policy.
    pub probe: ProbeConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            service_port: 3423,
            identity_path: "/ping".to_string(),
            stop_grace: Duration::from_secs(5),
            probe: ProbeConfig::default(),
        }
    }
}
