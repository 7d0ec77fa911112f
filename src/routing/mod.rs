//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → classifier.rs (evaluate pattern lists)
//!     → Return: Public | Admin | TenantIsolated | Default
//!
//! Pattern Compilation (at startup):
//!     RouteClassConfig
//!     → Compile patterns (exact literals, prefixes)
//!     → Freeze as immutable RouteClassifier
//! ```
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - No regex in hot path (exact / prefix matching only)
//! - Deterministic: same input always yields same class

pub mod classifier;

pub use classifier::{RouteClass, RouteClassifier};
