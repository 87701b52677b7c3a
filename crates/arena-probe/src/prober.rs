//! Probe loop and single-attempt handshake.

use std::time::Duration;

use http_body_util::BodyExt;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::debug;

use arena_core::{AgentIdentity, Endpoint, ProbeConfig};

use crate::backoff::Backoff;
use crate::error::ProbeError;

/// Outcome of one handshake attempt.
enum Attempt {
    /// Decoded identity payload.
    Identity(AgentIdentity),
    /// A response arrived but the payload is malformed. Terminal.
    Violation(String),
    /// Network-level failure. Retried.
    Transient(String),
}

/// Retrying identity prober.
///
/// An optional shutdown signal aborts an in-flight probe early instead
/// of waiting out the backoff budget; a closed channel counts as
/// shutdown.
#[derive(Clone)]
pub struct Prober {
    config: ProbeConfig,
    shutdown: Option<watch::Receiver<bool>>,
}

impl Prober {
    pub fn new(config: ProbeConfig) -> Self {
        Self {
            config,
            shutdown: None,
        }
    }

    /// Attach an external shutdown signal.
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Probe `endpoint` at `path` until an identity decodes, the payload
    /// proves malformed, or the elapsed-time budget runs out.
    ///
    /// Each in-flight attempt is clamped to the remaining budget, so the
    /// wall-clock duration of a failing probe never exceeds the budget
    /// by more than one attempt.
    pub async fn probe(
        &self,
        endpoint: &Endpoint,
        path: &str,
    ) -> Result<AgentIdentity, ProbeError> {
        let budget = self.config.max_elapsed;
        let deadline = Instant::now() + budget;
        let mut backoff = Backoff::new(&self.config);
        let mut shutdown = self.shutdown.clone();

        loop {
            if shutdown.as_ref().is_some_and(|rx| *rx.borrow()) {
                return Err(ProbeError::Cancelled);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(ProbeError::Timeout { budget });
            }

            let outcome = match tokio::time::timeout(deadline - now, attempt(endpoint, path)).await
            {
                Ok(outcome) => outcome,
                Err(_) => return Err(ProbeError::Timeout { budget }),
            };

            match outcome {
                Attempt::Identity(identity) => {
                    debug!(%endpoint, owner = %identity.owner, "agent identity decoded");
                    return Ok(identity);
                }
                Attempt::Violation(reason) => {
                    return Err(ProbeError::ProtocolViolation { reason });
                }
                Attempt::Transient(reason) => {
                    debug!(%endpoint, %reason, "probe attempt failed; retrying");
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ProbeError::Timeout { budget });
                    }
                    let delay = backoff.advance().min(deadline - now);
                    if !sleep_unless_shutdown(delay, &mut shutdown).await {
                        return Err(ProbeError::Cancelled);
                    }
                }
            }
        }
    }
}

/// Sleep for `delay`, racing the shutdown signal. Returns false when
/// shutdown won.
async fn sleep_unless_shutdown(
    delay: Duration,
    shutdown: &mut Option<watch::Receiver<bool>>,
) -> bool {
    match shutdown {
        Some(rx) => {
            tokio::select! {
                _ = tokio::time::sleep(delay) => true,
                _ = rx.wait_for(|stop| *stop) => false,
            }
        }
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}

/// One GET against the identity path. The HTTP status is deliberately
/// not consulted: the payload either decodes or it does not.
async fn attempt(endpoint: &Endpoint, path: &str) -> Attempt {
    let address = endpoint.to_string();

    let stream = match tokio::net::TcpStream::connect(&address).await {
        Ok(s) => s,
        Err(e) => return Attempt::Transient(format!("connect: {e}")),
    };

    let io = hyper_util::rt::TokioIo::new(stream);
    let (mut sender, conn) = match hyper::client::conn::http1::handshake(io).await {
        Ok(pair) => pair,
        Err(e) => return Attempt::Transient(format!("handshake: {e}")),
    };

    // Drive the connection in the background.
    tokio::spawn(async move {
        let _ = conn.await;
    });

    let req = http::Request::builder()
        .method("GET")
        .uri(format!("http://{address}{path}"))
        .header("host", address.as_str())
        .header("user-agent", "arena-probe/0.1")
        .body(http_body_util::Empty::<bytes::Bytes>::new())
        .unwrap();

    let response = match sender.send_request(req).await {
        Ok(r) => r,
        Err(e) => return Attempt::Transient(format!("request: {e}")),
    };

    let body = match response.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return Attempt::Transient(format!("body read: {e}")),
    };

    match serde_json::from_slice::<AgentIdentity>(&body) {
        Ok(identity) => Attempt::Identity(identity),
        Err(e) => Attempt::Violation(format!("undecodable identity payload: {e}")),
    }
}
