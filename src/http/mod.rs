//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, state, listener)
//!     → middleware/ (ip_gate → audit → authn → tenant)
//!     → business handlers (demo surface) / admin API
//!     → error.rs (structured denial responses)
//! ```

pub mod client_ip;
pub mod error;
pub mod middleware;
pub mod server;

pub use error::GateError;
pub use server::{build_router, AppState, GatewayServer};
