//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::security::events::EventKind;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Deployment mode. Drives the IP gate's admission policy.
    pub mode: Mode,

    /// Authentication settings (token secret, privileged role).
    pub auth: AuthConfig,

    /// Route classification pattern lists.
    pub routes: RouteClassConfig,

    /// Anomaly detector settings (caps, retention, thresholds).
    pub detector: DetectorConfig,

    /// Durable sink for CRITICAL security events.
    pub audit_log: AuditLogConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Deployment mode.
///
/// Development mode never rejects by IP and always admits loopback, so local
/// test runs cannot lock themselves out. Production mode enforces blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for bearer token verification (HS256).
    pub token_secret: String,

    /// Role name that grants privileged (admin) access.
    pub privileged_role: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Change this in production.
            token_secret: "CHANGE_ME_IN_PRODUCTION".to_string(),
            privileged_role: "admin".to_string(),
        }
    }
}

/// A single route pattern entry.
///
/// `method` is an HTTP method name or "*" for any method. A `path` ending in
/// "*" matches any path with that prefix; otherwise the match is literal.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RoutePatternConfig {
    /// HTTP method to match, or "*" for any.
    #[serde(default = "default_any_method")]
    pub method: String,

    /// Path literal, or prefix when terminated with "*".
    pub path: String,
}

fn default_any_method() -> String {
    "*".to_string()
}

impl RoutePatternConfig {
    /// Convenience constructor for defaults and tests.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_string(),
            path: path.to_string(),
        }
    }
}

/// Ordered pattern lists for route classification.
///
/// Lists are checked public -> admin -> tenant_isolated; first match wins.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouteClassConfig {
    /// Routes reachable without a credential.
    pub public: Vec<RoutePatternConfig>,

    /// Routes requiring the privileged role.
    pub admin: Vec<RoutePatternConfig>,

    /// Routes subject to tenant isolation enforcement.
    pub tenant_isolated: Vec<RoutePatternConfig>,
}

impl Default for RouteClassConfig {
    fn default() -> Self {
        Self {
            public: vec![
                RoutePatternConfig::new("GET", "/health"),
                RoutePatternConfig::new("POST", "/api/auth/login"),
                RoutePatternConfig::new("POST", "/api/auth/register"),
                RoutePatternConfig::new("*", "/api/public/*"),
                RoutePatternConfig::new("POST", "/webhooks/*"),
            ],
            admin: vec![RoutePatternConfig::new("*", "/admin/*")],
            tenant_isolated: vec![
                RoutePatternConfig::new("*", "/api/companies/*"),
                RoutePatternConfig::new("*", "/api/orders*"),
                RoutePatternConfig::new("*", "/api/products*"),
            ],
        }
    }
}

/// Escalation threshold for one event kind.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ThresholdConfig {
    /// Events within the window before the source IP is marked suspicious.
    /// Twice this count blocks the IP.
    pub count: usize,

    /// Sliding window length in seconds.
    pub window_secs: u64,
}

/// Anomaly detector configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DetectorConfig {
    /// Maximum retained events per event kind (FIFO eviction past this).
    pub max_events_per_type: usize,

    /// Events older than this are dropped by the sweep.
    pub event_retention_secs: u64,

    /// Interval between background sweeps.
    pub sweep_interval_secs: u64,

    /// Per-kind escalation thresholds. Kinds without an entry never escalate.
    pub thresholds: HashMap<EventKind, ThresholdConfig>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        let mut thresholds = HashMap::new();
        thresholds.insert(
            EventKind::FailedAuth,
            ThresholdConfig {
                count: 10,
                window_secs: 300,
            },
        );
        thresholds.insert(
            EventKind::AuthFailure,
            ThresholdConfig {
                count: 10,
                window_secs: 300,
            },
        );
        thresholds.insert(
            EventKind::TokenInvalid,
            ThresholdConfig {
                count: 10,
                window_secs: 300,
            },
        );
        thresholds.insert(
            EventKind::AccessDenied,
            ThresholdConfig {
                count: 20,
                window_secs: 600,
            },
        );
        thresholds.insert(
            EventKind::CompanyViolation,
            ThresholdConfig {
                count: 3,
                window_secs: 600,
            },
        );
        thresholds.insert(
            EventKind::ErrorResponse,
            ThresholdConfig {
                count: 50,
                window_secs: 300,
            },
        );
        Self {
            max_events_per_type: 1000,
            event_retention_secs: 7 * 24 * 3600,
            sweep_interval_secs: 3600,
            thresholds,
        }
    }
}

/// Durable audit sink configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuditLogConfig {
    /// Append-only JSONL file for CRITICAL events. Disabled when unset.
    pub path: Option<String>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format: "json" or "pretty".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
