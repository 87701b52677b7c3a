//! arena-validator — end-to-end agent image validation.
//!
//! Sequences the lifecycle manager and the health probe into one
//! operation: acquire a container, discover its endpoint, probe it,
//! interpret the result, and unconditionally release the container.
//!
//! ```text
//! Idle → Acquiring → EndpointResolving → Probing → {Validated | Rejected} → Released
//! ```
//!
//! `Released` is reached from every branch. Agent-caused failures
//! (missing service port, ambiguous mapping, protocol violation,
//! timeout, refused identity) become a [`Verdict::Rejected`];
//! infrastructure failures stay hard errors. A teardown failure never
//! overrides the verdict; it rides along as a secondary signal.

pub mod error;
pub mod report;
pub mod validator;

pub use error::ValidationError;
pub use report::{RejectReason, ValidationReport, Verdict};
pub use validator::{AcceptancePolicy, Validator};
