//! End-to-end validation scenarios against an in-memory container
//! runtime and real loopback HTTP listeners.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use arena_core::{Endpoint, ProbeConfig, ValidatorConfig};
use arena_lifecycle::{ContainerRuntime, LifecycleError};
use arena_validator::{RejectReason, ValidationError, Validator, Verdict};

/// In-memory runtime: fixed port map, failure injection, stop counter.
#[derive(Default)]
struct FakeRuntime {
    fail_create: bool,
    fail_inspect: bool,
    fail_stop: bool,
    ports: HashMap<u16, Vec<Endpoint>>,
    stops: AtomicUsize,
}

impl FakeRuntime {
    fn publishing(port: u16, endpoint: Endpoint) -> Self {
        Self {
            ports: HashMap::from([(port, vec![endpoint])]),
            ..Default::default()
        }
    }

    fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn create(&self, image: &str) -> anyhow::Result<String> {
        if self.fail_create {
            anyhow::bail!("no such image: {image}");
        }
        Ok("ctr-0".to_string())
    }

    async fn start(&self, _container_id: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn published_ports(
        &self,
        _container_id: &str,
    ) -> anyhow::Result<HashMap<u16, Vec<Endpoint>>> {
        if self.fail_inspect {
            anyhow::bail!("daemon unreachable");
        }
        Ok(self.ports.clone())
    }

    async fn stop(&self, _container_id: &str, _grace: Duration) -> anyhow::Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        if self.fail_stop {
            anyhow::bail!("daemon error on stop");
        }
        Ok(())
    }
}

fn test_config() -> ValidatorConfig {
    ValidatorConfig {
        probe: ProbeConfig {
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(50),
            max_elapsed: Duration::from_millis(300),
            multiplier: 2.0,
        },
        ..ValidatorConfig::default()
    }
}

fn validator(runtime: Arc<FakeRuntime>) -> Validator {
    Validator::new(runtime, test_config())
}

/// Loopback HTTP server answering every connection with `body`.
async fn spawn_agent(body: &'static str) -> (Endpoint, Arc<AtomicUsize>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else {
                break;
            };
            counter.fetch_add(1, Ordering::SeqCst);
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    (Endpoint::new("127.0.0.1", port), hits)
}

/// An endpoint that refuses every connection.
async fn dead_endpoint() -> Endpoint {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    Endpoint::new("127.0.0.1", port)
}

#[tokio::test]
async fn ok_agent_validates() {
    let (endpoint, _) = spawn_agent(r#"{"Owner":"btc","Taunts":["gg"]}"#).await;
    let runtime = Arc::new(FakeRuntime::publishing(3423, endpoint));

    let report = validator(runtime.clone())
        .validate_image("ok-agent")
        .await
        .unwrap();

    match report.verdict {
        Verdict::Validated { identity } => {
            assert_eq!(identity.owner, "btc");
            assert_eq!(identity.taunts, vec!["gg"]);
        }
        Verdict::Rejected { reason } => panic!("unexpected rejection: {reason}"),
    }
    assert!(report.teardown.is_none());
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn bad_port_is_rejected_and_container_stopped() {
    let runtime = Arc::new(FakeRuntime::publishing(
        8080,
        Endpoint::new("127.0.0.1", 49001),
    ));

    let report = validator(runtime.clone())
        .validate_image("bad-port")
        .await
        .unwrap();

    assert!(matches!(
        report.verdict,
        Verdict::Rejected {
            reason: RejectReason::PortNotExposed { port: 3423, .. }
        }
    ));
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn ambiguous_mapping_is_rejected() {
    let runtime = Arc::new(FakeRuntime {
        ports: HashMap::from([(
            3423,
            vec![
                Endpoint::new("127.0.0.1", 49001),
                Endpoint::new("127.0.0.1", 49002),
            ],
        )]),
        ..Default::default()
    });

    let report = validator(runtime.clone())
        .validate_image("double-bind")
        .await
        .unwrap();

    assert!(matches!(
        report.verdict,
        Verdict::Rejected {
            reason: RejectReason::AmbiguousMapping { port: 3423, count: 2 }
        }
    ));
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn slow_agent_times_out_and_container_stopped() {
    let endpoint = dead_endpoint().await;
    let runtime = Arc::new(FakeRuntime::publishing(3423, endpoint));

    let report = validator(runtime.clone())
        .validate_image("slow-agent")
        .await
        .unwrap();

    assert!(matches!(
        report.verdict,
        Verdict::Rejected {
            reason: RejectReason::Timeout { .. }
        }
    ));
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn garbage_agent_rejected_on_first_attempt() {
    let (endpoint, hits) = spawn_agent("garbage garbage").await;
    let runtime = Arc::new(FakeRuntime::publishing(3423, endpoint));

    let report = validator(runtime.clone())
        .validate_image("garbage-agent")
        .await
        .unwrap();

    assert!(matches!(
        report.verdict,
        Verdict::Rejected {
            reason: RejectReason::ProtocolViolation { .. }
        }
    ));
    // Malformed responses are terminal: exactly one probe attempt.
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn creation_failure_releases_nothing() {
    let runtime = Arc::new(FakeRuntime {
        fail_create: true,
        ..Default::default()
    });

    let err = validator(runtime.clone())
        .validate_image("absent-image")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ValidationError::Lifecycle(LifecycleError::Creation { .. })
    ));
    assert_eq!(runtime.stop_count(), 0);
}

#[tokio::test]
async fn inspection_failure_is_hard_error_and_container_stopped() {
    let runtime = Arc::new(FakeRuntime {
        fail_inspect: true,
        ..Default::default()
    });

    let err = validator(runtime.clone())
        .validate_image("uninspectable")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ValidationError::Lifecycle(LifecycleError::Inspection { .. })
    ));
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn teardown_failure_does_not_override_verdict() {
    let (endpoint, _) = spawn_agent(r#"{"Owner":"btc","Taunts":[]}"#).await;
    let runtime = Arc::new(FakeRuntime {
        fail_stop: true,
        ports: HashMap::from([(3423, vec![endpoint])]),
        ..Default::default()
    });

    let report = validator(runtime.clone())
        .validate_image("ok-agent")
        .await
        .unwrap();

    assert!(report.verdict.is_validated());
    assert!(matches!(
        report.teardown,
        Some(LifecycleError::Teardown { .. })
    ));
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn acceptance_policy_can_refuse_decoded_identity() {
    let (endpoint, _) = spawn_agent(r#"{"Owner":"mallory","Taunts":[]}"#).await;
    let runtime = Arc::new(FakeRuntime::publishing(3423, endpoint));

    let report = validator(runtime.clone())
        .with_policy(Arc::new(|identity| identity.owner == "btc"))
        .validate_image("impostor-agent")
        .await
        .unwrap();

    match report.verdict {
        Verdict::Rejected {
            reason: RejectReason::IdentityRefused { owner },
        } => assert_eq!(owner, "mallory"),
        other => panic!("unexpected verdict: {other:?}"),
    }
    assert_eq!(runtime.stop_count(), 1);
}

#[tokio::test]
async fn concurrent_validations_are_independent() {
    let (good, _) = spawn_agent(r#"{"Owner":"btc","Taunts":["gg"]}"#).await;
    let good_runtime = Arc::new(FakeRuntime::publishing(3423, good));
    let bad_runtime = Arc::new(FakeRuntime::publishing(
        8080,
        Endpoint::new("127.0.0.1", 49001),
    ));

    let good_validator = validator(good_runtime.clone());
    let bad_validator = validator(bad_runtime.clone());

    let (good_report, bad_report) = tokio::join!(
        good_validator.validate_image("ok-agent"),
        bad_validator.validate_image("bad-port"),
    );

    assert!(good_report.unwrap().verdict.is_validated());
    assert!(!bad_report.unwrap().verdict.is_validated());
    assert_eq!(good_runtime.stop_count(), 1);
    assert_eq!(bad_runtime.stop_count(), 1);
}
