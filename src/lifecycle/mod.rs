//! Process lifecycle: startup ordering and graceful shutdown.
//!
//! # Design Decisions
//! - One broadcast channel fans the shutdown signal out to the server and
//!   the background sweep task
//! - Signal handling lives in the binary, not the library

pub mod shutdown;

pub use shutdown::Shutdown;
