//! arena-probe — health probe protocol for Agent Arena.
//!
//! Repeatedly attempts a bounded identity handshake against a discovered
//! endpoint. Network-level failures are transient and retried with
//! exponential backoff; a received-but-undecodable payload is a protocol
//! violation and fails immediately, since repeating a malformed-response
//! probe cannot change the outcome. The whole probe is bounded by a
//! wall-clock budget so a validation never blocks a tournament
//! indefinitely.

mod backoff;
pub mod error;
pub mod prober;

pub use error::ProbeError;
pub use prober::Prober;
