//! Probe error types.

use std::time::Duration;

use thiserror::Error;

/// Terminal probe failures. Transient network errors never surface
/// here; they are retried until the elapsed-time budget runs out.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The agent responded, but the payload was not a decodable
    /// identity record. Not retried.
    #[error("agent response violated the identity protocol: {reason}")]
    ProtocolViolation { reason: String },

    /// No successful handshake within the elapsed-time budget.
    #[error("agent did not produce a valid identity within {budget:?}")]
    Timeout { budget: Duration },

    /// The probe was aborted by an external shutdown signal.
    #[error("probe cancelled by shutdown")]
    Cancelled,
}
