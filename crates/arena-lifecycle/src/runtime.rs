//! Container runtime abstraction.
//!
//! The validation path only needs a create/start/inspect/stop capability
//! set, so that is all the trait exposes. The trait must be safe for
//! concurrent use: independent validations share one runtime client.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use arena_core::Endpoint;

/// Capability set the lifecycle manager needs from a container runtime.
///
/// None of these operations are idempotent: creating twice from the same
/// image yields two independent containers.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Create a container from an image reference, configured to publish
    /// all container-exposed ports to ephemeral host ports on start.
    /// Returns the runtime-assigned container id.
    async fn create(&self, image: &str) -> anyhow::Result<String>;

    /// Start a created container.
    async fn start(&self, container_id: &str) -> anyhow::Result<()>;

    /// Published TCP port mappings of a running container, keyed by
    /// container port.
    async fn published_ports(
        &self,
        container_id: &str,
    ) -> anyhow::Result<HashMap<u16, Vec<Endpoint>>>;

    /// Stop a container, allowing `grace` for graceful shutdown before
    /// forced termination.
    async fn stop(&self, container_id: &str, grace: Duration) -> anyhow::Result<()>;
}
