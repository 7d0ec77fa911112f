//! Multi-tenant request gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                    GATEWAY                        │
//!                 │                                                   │
//!  Client Request │  ┌─────────┐  ┌───────┐  ┌───────┐  ┌────────┐   │
//!  ───────────────┼─▶│ ip_gate │─▶│ audit │─▶│ authn │─▶│ tenant │───┼─▶ business
//!                 │  └────┬────┘  └───┬───┘  └───┬───┘  └───┬────┘   │   handlers
//!                 │       │           │          │          │        │
//!                 │       │ reads     │ feeds    │ reads    │ reads  │
//!                 │       ▼           ▼          ▼          ▼        │
//!                 │  ┌──────────────────────────────────────────┐    │
//!                 │  │       security (detector + events)       │    │
//!                 │  │  sliding windows · suspicious/blocked    │    │
//!                 │  │  hourly sweep · CRITICAL → durable sink  │    │
//!                 │  └──────────────────────────────────────────┘    │
//!                 │                                                   │
//!                 │  ┌────────────────────────────────────────────┐  │
//!                 │  │            Cross-Cutting Concerns          │  │
//!                 │  │  config · routing · observability ·        │  │
//!                 │  │  lifecycle · admin API                     │  │
//!                 │  └────────────────────────────────────────────┘  │
//!                 └──────────────────────────────────────────────────┘
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod routing;
pub mod security;

// APIs over the core
pub mod admin;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::GatewayConfig;
pub use http::{AppState, GatewayServer};
pub use lifecycle::Shutdown;
