//! Docker implementation of [`ContainerRuntime`] via bollard.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::service::HostConfig;
use tracing::debug;

use arena_core::Endpoint;

use crate::runtime::ContainerRuntime;

/// Bollard-backed container runtime.
///
/// `Docker` is cheaply cloneable and safe for concurrent use, so one
/// `DockerRuntime` serves every in-flight validation.
#[derive(Clone)]
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn create(&self, image: &str) -> anyhow::Result<String> {
        let config = Config {
            image: Some(image.to_string()),
            host_config: Some(HostConfig {
                publish_all_ports: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(None::<CreateContainerOptions<String>>, config)
            .await?;
        debug!(%image, container_id = %response.id, "container created");
        Ok(response.id)
    }

    async fn start(&self, container_id: &str) -> anyhow::Result<()> {
        self.docker
            .start_container(container_id, None::<StartContainerOptions<String>>)
            .await?;
        debug!(%container_id, "container started");
        Ok(())
    }

    async fn published_ports(
        &self,
        container_id: &str,
    ) -> anyhow::Result<HashMap<u16, Vec<Endpoint>>> {
        let inspect = self.docker.inspect_container(container_id, None).await?;

        let mut mappings: HashMap<u16, Vec<Endpoint>> = HashMap::new();
        let ports = inspect
            .network_settings
            .and_then(|settings| settings.ports)
            .unwrap_or_default();

        for (key, bindings) in ports {
            // Keys look like "3423/tcp"; only TCP mappings matter here.
            let Some((port, "tcp")) = key.split_once('/') else {
                continue;
            };
            let Ok(port) = port.parse::<u16>() else {
                continue;
            };

            let endpoints = mappings.entry(port).or_default();
            for binding in bindings.into_iter().flatten() {
                let Some(host_port) = binding
                    .host_port
                    .as_deref()
                    .and_then(|p| p.parse::<u16>().ok())
                else {
                    continue;
                };
                endpoints.push(Endpoint::new(host_address(binding.host_ip), host_port));
            }
        }

        // Exposed-but-unbound ports show up with no bindings; drop them.
        mappings.retain(|_, endpoints| !endpoints.is_empty());
        Ok(mappings)
    }

    async fn stop(&self, container_id: &str, grace: Duration) -> anyhow::Result<()> {
        let options = StopContainerOptions {
            t: grace.as_secs() as i64,
        };
        self.docker
            .stop_container(container_id, Some(options))
            .await?;
        debug!(%container_id, "container stopped");
        Ok(())
    }
}

/// Normalize a runtime-reported bind address into something a client
/// can actually connect to.
fn host_address(host_ip: Option<String>) -> String {
    match host_ip.as_deref() {
        None | Some("") | Some("0.0.0.0") | Some("::") => "127.0.0.1".to_string(),
        Some(ip) => ip.to_string(),
    }
}
