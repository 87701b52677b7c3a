//! arena-lifecycle — container lifecycle management for Agent Arena.
//!
//! Owns the full lifecycle of a single agent container during one
//! validation: create, start with all exposed ports published, resolve
//! the host endpoint of the agent service port, and stop.
//!
//! # Architecture
//!
//! ```text
//! LifecycleManager
//!   ├── acquire()          create + start → ContainerGuard
//!   ├── resolve_endpoint() inspect port map → Endpoint
//!   └── ContainerGuard     release() stops exactly once;
//!                          Drop is a best-effort backstop
//! ```
//!
//! The manager talks to the runtime through the [`ContainerRuntime`]
//! trait so tests can substitute an in-memory runtime; [`DockerRuntime`]
//! is the bollard-backed production implementation.

pub mod docker;
pub mod error;
pub mod manager;
pub mod runtime;

pub use docker::DockerRuntime;
pub use error::{LifecycleError, LifecycleResult};
pub use manager::{ContainerGuard, LifecycleManager};
pub use runtime::ContainerRuntime;
