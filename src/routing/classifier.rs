//! Route classification logic.
//!
//! # Responsibilities
//! - Match (method, path) against the configured pattern lists
//! - Return the route class driving the rest of the middleware chain
//!
//! # Design Decisions
//! - Patterns compiled at startup, immutable at runtime
//! - Exact or prefix matching only; no regex, O(n) over a few tens of entries
//! - Checked in order public -> admin -> tenant_isolated; first match wins
//! - No path normalization: trailing slashes and case differences are
//!   literal mismatches, matching the behavior this gateway replaces

use axum::http::Method;

use crate::config::schema::{RouteClassConfig, RoutePatternConfig};

/// The admission class of a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// No credential required.
    Public,
    /// Privileged role required.
    Admin,
    /// Caller may only touch its own tenant's data.
    TenantIsolated,
    /// Authenticated, no extra constraints.
    Default,
}

/// Path portion of a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathPattern {
    Exact(String),
    Prefix(String),
}

/// One compiled (method, path) pattern.
#[derive(Debug, Clone)]
struct RoutePattern {
    /// None matches any method.
    method: Option<Method>,
    path: PathPattern,
}

impl RoutePattern {
    fn compile(config: &RoutePatternConfig) -> Self {
        let method = if config.method == "*" {
            None
        } else {
            config.method.to_uppercase().parse::<Method>().ok()
        };
        let path = match config.path.strip_suffix('*') {
            Some(prefix) => PathPattern::Prefix(prefix.to_string()),
            None => PathPattern::Exact(config.path.clone()),
        };
        Self { method, path }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if let Some(expected) = &self.method {
            if expected != method {
                return false;
            }
        }
        match &self.path {
            PathPattern::Exact(p) => path == p,
            PathPattern::Prefix(p) => path.starts_with(p.as_str()),
        }
    }
}

/// Immutable classifier built from config at startup.
#[derive(Debug, Clone)]
pub struct RouteClassifier {
    public: Vec<RoutePattern>,
    admin: Vec<RoutePattern>,
    tenant_isolated: Vec<RoutePattern>,
}

impl RouteClassifier {
    pub fn from_config(config: &RouteClassConfig) -> Self {
        let compile = |patterns: &[RoutePatternConfig]| {
            patterns.iter().map(RoutePattern::compile).collect::<Vec<_>>()
        };
        Self {
            public: compile(&config.public),
            admin: compile(&config.admin),
            tenant_isolated: compile(&config.tenant_isolated),
        }
    }

    /// Classify a request. Deterministic, O(number of patterns).
    pub fn classify(&self, method: &Method, path: &str) -> RouteClass {
        if self.public.iter().any(|p| p.matches(method, path)) {
            RouteClass::Public
        } else if self.admin.iter().any(|p| p.matches(method, path)) {
            RouteClass::Admin
        } else if self.tenant_isolated.iter().any(|p| p.matches(method, path)) {
            RouteClass::TenantIsolated
        } else {
            RouteClass::Default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteClassConfig;

    fn classifier() -> RouteClassifier {
        RouteClassifier::from_config(&RouteClassConfig::default())
    }

    #[test]
    fn exact_public_match() {
        let c = classifier();
        assert_eq!(c.classify(&Method::GET, "/health"), RouteClass::Public);
        // Method is part of the pattern.
        assert_eq!(c.classify(&Method::POST, "/health"), RouteClass::Default);
    }

    #[test]
    fn prefix_match_with_any_method() {
        let c = classifier();
        assert_eq!(
            c.classify(&Method::GET, "/api/public/plans"),
            RouteClass::Public
        );
        assert_eq!(
            c.classify(&Method::DELETE, "/api/public/plans/3"),
            RouteClass::Public
        );
    }

    #[test]
    fn admin_prefix() {
        let c = classifier();
        assert_eq!(
            c.classify(&Method::GET, "/admin/security/report"),
            RouteClass::Admin
        );
    }

    #[test]
    fn tenant_isolated_prefix() {
        let c = classifier();
        assert_eq!(
            c.classify(&Method::GET, "/api/companies/abc/orders"),
            RouteClass::TenantIsolated
        );
        assert_eq!(
            c.classify(&Method::POST, "/api/orders"),
            RouteClass::TenantIsolated
        );
    }

    #[test]
    fn unmatched_is_default() {
        let c = classifier();
        assert_eq!(c.classify(&Method::GET, "/api/profile"), RouteClass::Default);
    }

    #[test]
    fn no_path_normalization() {
        let c = classifier();
        // Trailing slash and case differences are literal mismatches.
        assert_eq!(c.classify(&Method::GET, "/health/"), RouteClass::Default);
        assert_eq!(c.classify(&Method::GET, "/Health"), RouteClass::Default);
    }

    #[test]
    fn public_wins_over_later_lists() {
        let mut config = RouteClassConfig::default();
        config
            .public
            .push(RoutePatternConfig::new("GET", "/api/companies/status"));
        let c = RouteClassifier::from_config(&config);
        assert_eq!(
            c.classify(&Method::GET, "/api/companies/status"),
            RouteClass::Public
        );
    }
}
