//! The gating middleware chain.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → ip_gate.rs  (deny blocked IPs before anything else)
//!     → audit.rs    (record request, observe response status)
//!     → authn.rs    (classify route, verify credential, attach identity)
//!     → tenant.rs   (enforce tenant isolation on isolated routes)
//!     → business handler
//! ```
//!
//! # Design Decisions
//! - Fail closed: any check failure terminates with a structured denial
//! - Stages communicate through typed request/response extensions
//! - Only the audit stage feeds error outcomes back into the detector

pub mod audit;
pub mod authn;
pub mod ip_gate;
pub mod tenant;

pub use audit::audit_middleware;
pub use authn::{authn_middleware, Identity};
pub use ip_gate::ip_gate_middleware;
pub use tenant::{tenant_guard_middleware, TenantContext};
