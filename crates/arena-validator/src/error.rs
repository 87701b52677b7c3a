//! Validation error types.

use thiserror::Error;

use arena_lifecycle::LifecycleError;

/// Hard validation failures: infrastructure faults, not agent verdicts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The container runtime failed (creation, start, or inspection).
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// Validation was aborted by an external shutdown signal.
    #[error("validation cancelled by shutdown")]
    Cancelled,
}
