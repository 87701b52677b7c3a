//! Validation verdicts and the per-call report.

use std::fmt;
use std::time::Duration;

use arena_core::AgentIdentity;
use arena_lifecycle::LifecycleError;

/// Why an agent image was rejected. Every variant is agent-caused, as
/// opposed to an infrastructure failure.
#[derive(Debug)]
pub enum RejectReason {
    /// The container never published the agent service port.
    PortNotExposed { port: u16, published: Vec<u16> },
    /// More than one host mapping for the service port.
    AmbiguousMapping { port: u16, count: usize },
    /// The agent answered with a malformed identity payload.
    ProtocolViolation { reason: String },
    /// The agent never produced a valid identity within the budget.
    Timeout { budget: Duration },
    /// The identity decoded but the acceptance policy refused it.
    IdentityRefused { owner: String },
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::PortNotExposed { port, published } => {
                write!(f, "service port {port}/tcp not published (found {published:?})")
            }
            RejectReason::AmbiguousMapping { port, count } => {
                write!(f, "ambiguous mapping for port {port}/tcp ({count} bindings)")
            }
            RejectReason::ProtocolViolation { reason } => {
                write!(f, "protocol violation: {reason}")
            }
            RejectReason::Timeout { budget } => {
                write!(f, "no valid identity within {budget:?}")
            }
            RejectReason::IdentityRefused { owner } => {
                write!(f, "identity refused by acceptance policy (owner {owner:?})")
            }
        }
    }
}

/// The validation decision for one agent image.
#[derive(Debug)]
pub enum Verdict {
    /// The agent spoke the identity protocol and passed the policy.
    Validated { identity: AgentIdentity },
    /// The agent is not acceptable for tournament play.
    Rejected { reason: RejectReason },
}

impl Verdict {
    pub fn is_validated(&self) -> bool {
        matches!(self, Verdict::Validated { .. })
    }
}

/// Outcome of one `validate_image` call.
///
/// `teardown` carries a release failure as a secondary signal: the
/// verdict stands, but the container may be leaked and operators need
/// to reclaim it.
#[derive(Debug)]
pub struct ValidationReport {
    pub verdict: Verdict,
    pub teardown: Option<LifecycleError>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reject_reason_display() {
        let reason = RejectReason::PortNotExposed {
            port: 3423,
            published: vec![80],
        };
        assert_eq!(
            reason.to_string(),
            "service port 3423/tcp not published (found [80])"
        );
    }

    #[test]
    fn verdict_is_validated() {
        let verdict = Verdict::Validated {
            identity: AgentIdentity {
                owner: "btc".to_string(),
                taunts: vec![],
            },
        };
        assert!(verdict.is_validated());

        let verdict = Verdict::Rejected {
            reason: RejectReason::Timeout {
                budget: Duration::from_secs(10),
            },
        };
        assert!(!verdict.is_validated());
    }
}
