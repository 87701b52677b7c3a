//! arena-core — shared types and configuration for Agent Arena.
//!
//! Agent Arena supervises untrusted, containerized game-playing agents:
//! it launches an agent image, discovers the published endpoint, and
//! checks that the workload speaks the identity protocol. This crate
//! holds the types and config structs shared by the lifecycle, probe,
//! and validator crates.

pub mod config;
pub mod types;

pub use config::{ProbeConfig, ValidatorConfig};
pub use types::{AgentIdentity, Endpoint};
