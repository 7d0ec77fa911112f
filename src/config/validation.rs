//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check value ranges (caps, intervals, thresholds > 0)
//! - Reject obviously unsafe production settings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig -> Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::{GatewayConfig, Mode};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address".into(),
            message: format!("not a valid socket address: {}", config.listener.bind_address),
        });
    }

    if config.mode == Mode::Production && config.auth.token_secret == "CHANGE_ME_IN_PRODUCTION" {
        errors.push(ValidationError {
            field: "auth.token_secret".into(),
            message: "placeholder secret is not allowed in production mode".into(),
        });
    }

    if config.auth.privileged_role.is_empty() {
        errors.push(ValidationError {
            field: "auth.privileged_role".into(),
            message: "must not be empty".into(),
        });
    }

    if config.detector.max_events_per_type == 0 {
        errors.push(ValidationError {
            field: "detector.max_events_per_type".into(),
            message: "must be greater than zero".into(),
        });
    }

    if config.detector.sweep_interval_secs == 0 {
        errors.push(ValidationError {
            field: "detector.sweep_interval_secs".into(),
            message: "must be greater than zero".into(),
        });
    }

    for (kind, threshold) in &config.detector.thresholds {
        if threshold.count == 0 || threshold.window_secs == 0 {
            errors.push(ValidationError {
                field: format!("detector.thresholds.{kind}"),
                message: "count and window_secs must be greater than zero".into(),
            });
        }
    }

    for (list, patterns) in [
        ("public", &config.routes.public),
        ("admin", &config.routes.admin),
        ("tenant_isolated", &config.routes.tenant_isolated),
    ] {
        for pattern in patterns {
            if !pattern.path.starts_with('/') {
                errors.push(ValidationError {
                    field: format!("routes.{list}"),
                    message: format!("path must start with '/': {}", pattern.path),
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::GatewayConfig;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn production_rejects_placeholder_secret() {
        let mut config = GatewayConfig::default();
        config.mode = Mode::Production;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "auth.token_secret"));
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.detector.max_events_per_type = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
