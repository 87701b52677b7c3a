//! Lifecycle manager and scoped container guard.
//!
//! Acquiring a container yields a [`ContainerGuard`] that is responsible
//! for stopping it. `release()` consumes the guard and stops the
//! container exactly once; if a guard is dropped without being released
//! (early return, panic unwind), `Drop` spawns a best-effort stop so the
//! container is not leaked.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use arena_core::{Endpoint, ValidatorConfig};

use crate::error::{LifecycleError, LifecycleResult};
use crate::runtime::ContainerRuntime;

/// Creates, inspects, and stops agent containers for one validation at
/// a time. Holds no per-container state; all state lives in the guard.
#[derive(Clone)]
pub struct LifecycleManager {
    runtime: Arc<dyn ContainerRuntime>,
    service_port: u16,
    stop_grace: Duration,
}

impl LifecycleManager {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: &ValidatorConfig) -> Self {
        Self {
            runtime,
            service_port: config.service_port,
            stop_grace: config.stop_grace,
        }
    }

    /// Create and start a container for `image`, publishing all exposed
    /// ports to ephemeral host ports.
    ///
    /// A creation failure leaves nothing behind. A start failure stops
    /// the already created container before the error propagates, so the
    /// caller never has to clean up after a failed acquire.
    pub async fn acquire(&self, image: &str) -> LifecycleResult<ContainerGuard> {
        let container_id =
            self.runtime
                .create(image)
                .await
                .map_err(|cause| LifecycleError::Creation {
                    image: image.to_string(),
                    cause,
                })?;

        let guard = ContainerGuard {
            runtime: self.runtime.clone(),
            container_id: container_id.clone(),
            stop_grace: self.stop_grace,
            released: false,
        };

        if let Err(cause) = self.runtime.start(&container_id).await {
            if let Err(teardown) = guard.release().await {
                warn!(error = %teardown, "teardown after failed start also failed");
            }
            return Err(LifecycleError::Start {
                container_id,
                cause,
            });
        }

        debug!(%image, %container_id, "container acquired");
        Ok(guard)
    }

    /// Resolve the single host endpoint the agent service port was
    /// published to.
    pub async fn resolve_endpoint(&self, guard: &ContainerGuard) -> LifecycleResult<Endpoint> {
        let container_id = guard.id();
        let mappings = self
            .runtime
            .published_ports(container_id)
            .await
            .map_err(|cause| LifecycleError::Inspection {
                container_id: container_id.to_string(),
                cause,
            })?;

        let Some(endpoints) = mappings.get(&self.service_port) else {
            let mut published: Vec<u16> = mappings.keys().copied().collect();
            published.sort_unstable();
            return Err(LifecycleError::PortNotExposed {
                port: self.service_port,
                published,
            });
        };

        match endpoints.as_slice() {
            [endpoint] => Ok(endpoint.clone()),
            many => Err(LifecycleError::AmbiguousMapping {
                port: self.service_port,
                count: many.len(),
            }),
        }
    }
}

/// Exclusive handle to one running (or stopped) container instance.
///
/// Never shared across validations; the owning validation must call
/// [`ContainerGuard::release`] on every branch.
pub struct ContainerGuard {
    runtime: Arc<dyn ContainerRuntime>,
    container_id: String,
    stop_grace: Duration,
    released: bool,
}

impl std::fmt::Debug for ContainerGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerGuard")
            .field("container_id", &self.container_id)
            .field("stop_grace", &self.stop_grace)
            .field("released", &self.released)
            .finish_non_exhaustive()
    }
}

impl ContainerGuard {
    /// Runtime-assigned container id.
    pub fn id(&self) -> &str {
        &self.container_id
    }

    /// Stop the container within the grace period. Consumes the guard,
    /// so release happens at most once per acquired container.
    pub async fn release(mut self) -> LifecycleResult<()> {
        self.released = true;
        self.runtime
            .stop(&self.container_id, self.stop_grace)
            .await
            .map_err(|cause| LifecycleError::Teardown {
                container_id: self.container_id.clone(),
                cause,
            })
    }
}

impl Drop for ContainerGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        warn!(
            container_id = %self.container_id,
            "container guard dropped without release; stopping in the background"
        );
        let runtime = self.runtime.clone();
        let container_id = self.container_id.clone();
        let grace = self.stop_grace;
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = runtime.stop(&container_id, grace).await {
                        error!(%container_id, error = %e, "background container stop failed");
                    }
                });
            }
            Err(_) => {
                error!(%container_id, "no async runtime available; container leaked");
            }
        }
    }
}
