//! The validation orchestrator.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use arena_core::{AgentIdentity, ValidatorConfig};
use arena_lifecycle::{ContainerRuntime, LifecycleError, LifecycleManager};
use arena_probe::{ProbeError, Prober};

use crate::error::ValidationError;
use crate::report::{RejectReason, ValidationReport, Verdict};

/// Semantic acceptance check applied to a structurally valid identity.
///
/// The protocol only requires a decodable payload; whether a particular
/// owner is welcome in a given tournament is policy, so it stays
/// pluggable. The default accepts everything.
pub type AcceptancePolicy = Arc<dyn Fn(&AgentIdentity) -> bool + Send + Sync>;

/// Validates agent images one at a time. Holds no state between calls;
/// concurrent validations of different images are independent.
#[derive(Clone)]
pub struct Validator {
    lifecycle: LifecycleManager,
    prober: Prober,
    identity_path: String,
    policy: AcceptancePolicy,
}

impl Validator {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: ValidatorConfig) -> Self {
        let lifecycle = LifecycleManager::new(runtime, &config);
        let prober = Prober::new(config.probe.clone());
        Self {
            lifecycle,
            prober,
            identity_path: config.identity_path,
            policy: Arc::new(|_| true),
        }
    }

    /// Wire an external shutdown signal into the probe loop so an
    /// in-flight validation aborts early instead of waiting out the
    /// backoff budget.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.prober = self.prober.with_shutdown(shutdown);
        self
    }

    /// Replace the accept-everything policy.
    pub fn with_policy(mut self, policy: AcceptancePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Validate one agent image end to end. The container is released
    /// on every branch; creation failures never produce a container.
    pub async fn validate_image(
        &self,
        image: &str,
    ) -> Result<ValidationReport, ValidationError> {
        info!(%image, "validating agent image");

        let guard = self.lifecycle.acquire(image).await?;

        let endpoint = match self.lifecycle.resolve_endpoint(&guard).await {
            Ok(endpoint) => endpoint,
            Err(e) => {
                let teardown = guard.release().await.err();
                report_teardown(&teardown);
                return match e {
                    LifecycleError::PortNotExposed { port, published } => Ok(ValidationReport {
                        verdict: Verdict::Rejected {
                            reason: RejectReason::PortNotExposed { port, published },
                        },
                        teardown,
                    }),
                    LifecycleError::AmbiguousMapping { port, count } => Ok(ValidationReport {
                        verdict: Verdict::Rejected {
                            reason: RejectReason::AmbiguousMapping { port, count },
                        },
                        teardown,
                    }),
                    other => Err(other.into()),
                };
            }
        };

        info!(%image, %endpoint, "service endpoint resolved; probing");
        let probed = self.prober.probe(&endpoint, &self.identity_path).await;

        let teardown = guard.release().await.err();
        report_teardown(&teardown);

        let verdict = match probed {
            Ok(identity) => {
                if (self.policy)(&identity) {
                    info!(%image, owner = %identity.owner, "agent image validated");
                    Verdict::Validated { identity }
                } else {
                    Verdict::Rejected {
                        reason: RejectReason::IdentityRefused {
                            owner: identity.owner,
                        },
                    }
                }
            }
            Err(ProbeError::ProtocolViolation { reason }) => Verdict::Rejected {
                reason: RejectReason::ProtocolViolation { reason },
            },
            Err(ProbeError::Timeout { budget }) => Verdict::Rejected {
                reason: RejectReason::Timeout { budget },
            },
            Err(ProbeError::Cancelled) => return Err(ValidationError::Cancelled),
        };

        if let Verdict::Rejected { reason } = &verdict {
            info!(%image, %reason, "agent image rejected");
        }

        Ok(ValidationReport { verdict, teardown })
    }
}

fn report_teardown(teardown: &Option<LifecycleError>) {
    if let Some(e) = teardown {
        warn!(error = %e, "container teardown failed; manual cleanup required");
    }
}
