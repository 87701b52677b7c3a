//! arenad — the Agent Arena daemon.
//!
//! Single binary that assembles the validation service:
//! - docker client (local socket, plain HTTP, or TLS)
//! - validation orchestrator with shutdown-aware probing
//! - REST API
//!
//! # Usage
//!
//! ```text
//! arenad --listen 0.0.0.0:8080
//! arenad --docker-host tcp://192.168.59.103:2376 --tls
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bollard::{API_DEFAULT_VERSION, Docker};
use clap::Parser;
use tokio::sync::watch;
use tracing::info;

use arena_core::ValidatorConfig;
use arena_lifecycle::DockerRuntime;
use arena_validator::Validator;

/// Timeout for individual docker API calls, in seconds.
const DOCKER_TIMEOUT_SECS: u64 = 120;

#[derive(Parser)]
#[command(name = "arenad", about = "Agent Arena daemon")]
struct Cli {
    /// address:port for the HTTP listener.
    #[arg(long, default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Address of the docker daemon (e.g. tcp://192.168.59.103:2376).
    /// Uses the local socket when unset.
    #[arg(long)]
    docker_host: Option<String>,

    /// Directory with the docker host TLS material (cert.pem, key.pem,
    /// ca.pem).
    #[arg(long, env = "DOCKER_CERT_PATH")]
    docker_cert_path: Option<PathBuf>,

    /// Connect to the docker daemon over TLS.
    #[arg(long)]
    tls: bool,
}

/// Resolved daemon configuration. All knobs are explicit; nothing else
/// reads flags or environment.
struct DaemonConfig {
    listen: SocketAddr,
    docker_host: Option<String>,
    docker_cert_path: Option<PathBuf>,
    use_tls: bool,
    validator: ValidatorConfig,
}

impl From<Cli> for DaemonConfig {
    fn from(cli: Cli) -> Self {
        Self {
            listen: cli.listen,
            docker_host: cli.docker_host,
            docker_cert_path: cli.docker_cert_path,
            use_tls: cli.tls,
            validator: ValidatorConfig::default(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,arenad=debug,arena=debug".parse().unwrap()),
        )
        .init();

    let config = DaemonConfig::from(Cli::parse());
    run(config).await
}

async fn run(config: DaemonConfig) -> anyhow::Result<()> {
    let docker = connect_docker(&config)?;
    info!("docker client initialized");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let runtime = Arc::new(DockerRuntime::new(docker.clone()));
    let validator = Arc::new(
        Validator::new(runtime, config.validator.clone()).with_shutdown(shutdown_rx),
    );
    info!(
        service_port = config.validator.service_port,
        identity_path = %config.validator.identity_path,
        "validator initialized"
    );

    let router = arena_api::build_router(docker, validator);

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!(addr = %config.listen, "agent arena daemon listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received; cancelling in-flight probes");
            let _ = shutdown_tx.send(true);
        })
        .await?;

    info!("agent arena daemon stopped");
    Ok(())
}

/// Build the docker client from the daemon config.
fn connect_docker(config: &DaemonConfig) -> anyhow::Result<Docker> {
    let docker = match (&config.docker_host, config.use_tls) {
        (Some(host), true) => {
            let certs = config
                .docker_cert_path
                .as_ref()
                .context("--docker-cert-path (or DOCKER_CERT_PATH) is required with --tls")?;
            Docker::connect_with_ssl(
                host,
                &certs.join("key.pem"),
                &certs.join("cert.pem"),
                &certs.join("ca.pem"),
                DOCKER_TIMEOUT_SECS,
                API_DEFAULT_VERSION,
            )?
        }
        (Some(host), false) => {
            Docker::connect_with_http(host, DOCKER_TIMEOUT_SECS, API_DEFAULT_VERSION)?
        }
        (None, _) => Docker::connect_with_local_defaults()?,
    };
    Ok(docker)
}
