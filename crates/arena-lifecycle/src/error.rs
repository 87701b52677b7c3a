//! Lifecycle error types.

use thiserror::Error;

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// Errors that can occur while managing an agent container.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// The runtime could not instantiate the image.
    #[error("failed to create container for image {image}: {cause}")]
    Creation { image: String, cause: anyhow::Error },

    /// The created container could not be started.
    #[error("failed to start container {container_id}: {cause}")]
    Start {
        container_id: String,
        cause: anyhow::Error,
    },

    /// Inspecting the running container failed.
    #[error("failed to inspect container {container_id}: {cause}")]
    Inspection {
        container_id: String,
        cause: anyhow::Error,
    },

    /// The container did not publish the agent service port.
    #[error("container must publish port {port}/tcp; published ports: {published:?}")]
    PortNotExposed { port: u16, published: Vec<u16> },

    /// More than one host mapping exists for the service port.
    ///
    /// The protocol assumes a single deterministic endpoint, so an
    /// ambiguous mapping is a contract violation rather than a choice.
    #[error("expected exactly one host mapping for port {port}/tcp, found {count}")]
    AmbiguousMapping { port: u16, count: usize },

    /// The runtime could not stop the container. The container may be
    /// leaked and needs operator attention.
    #[error("failed to stop container {container_id}: {cause}")]
    Teardown {
        container_id: String,
        cause: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_not_exposed_display() {
        let err = LifecycleError::PortNotExposed {
            port: 3423,
            published: vec![8080],
        };
        assert_eq!(
            err.to_string(),
            "container must publish port 3423/tcp; published ports: [8080]"
        );
    }

    #[test]
    fn ambiguous_mapping_display() {
        let err = LifecycleError::AmbiguousMapping {
            port: 3423,
            count: 2,
        };
        assert_eq!(
            err.to_string(),
            "expected exactly one host mapping for port 3423/tcp, found 2"
        );
    }
}
