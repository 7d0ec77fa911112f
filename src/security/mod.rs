//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware chain produces typed events:
//!     → events.rs (SecurityEvent, severity table)
//!     → detector.rs (capped logs, sliding-window escalation)
//!         → suspicious / blocked IP sets (read by the IP gate)
//!         → CRITICAL events → sink.rs (append-only JSONL)
//!     → sweep.rs (hourly retention + escalation amnesty)
//! ```
//!
//! # Design Decisions
//! - Single mutex over logs and sets: record/is_blocked/sweep serialize
//! - Escalation is one-way within a pass: observed -> suspicious -> blocked
//! - The sink is fire-and-forget; it can fail without failing a request

pub mod detector;
pub mod events;
pub mod sink;
pub mod sweep;

pub use detector::{AnomalyDetector, SecurityReport};
pub use events::{EventKind, SecurityEvent, Severity};
