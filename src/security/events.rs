//! Typed security events and severity classification.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// Every auditable occurrence the gateway can record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    // Volumetric visibility
    RequestReceived,

    // Authentication outcomes
    PublicRouteAccess,
    FailedAuth,
    TokenExpired,
    TokenInvalid,
    TokenError,
    SuccessfulAuth,
    UnauthorizedAdminAccess,

    // Tenant isolation outcomes
    CompanyIsolationFailure,
    CompanyViolation,
    CompanyAccessGranted,

    // Detector escalations
    SuspiciousActivity,
    IpBlocked,

    // IP gate observations
    BlockedIpAttempt,
    SuspiciousIpAccess,

    // Response audit (by status code)
    AuthFailure,
    AccessDenied,
    ErrorResponse,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // snake_case, matching the serde representation
        let s = match self {
            EventKind::RequestReceived => "request_received",
            EventKind::PublicRouteAccess => "public_route_access",
            EventKind::FailedAuth => "failed_auth",
            EventKind::TokenExpired => "token_expired",
            EventKind::TokenInvalid => "token_invalid",
            EventKind::TokenError => "token_error",
            EventKind::SuccessfulAuth => "successful_auth",
            EventKind::UnauthorizedAdminAccess => "unauthorized_admin_access",
            EventKind::CompanyIsolationFailure => "company_isolation_failure",
            EventKind::CompanyViolation => "company_violation",
            EventKind::CompanyAccessGranted => "company_access_granted",
            EventKind::SuspiciousActivity => "suspicious_activity",
            EventKind::IpBlocked => "ip_blocked",
            EventKind::BlockedIpAttempt => "blocked_ip_attempt",
            EventKind::SuspiciousIpAccess => "suspicious_ip_access",
            EventKind::AuthFailure => "auth_failure",
            EventKind::AccessDenied => "access_denied",
            EventKind::ErrorResponse => "error_response",
        };
        f.write_str(s)
    }
}

/// Event severity. CRITICAL events are additionally forwarded to the durable
/// audit sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl EventKind {
    /// Static severity table. Kinds not listed are LOW.
    pub fn severity(self) -> Severity {
        match self {
            EventKind::CompanyViolation | EventKind::IpBlocked => Severity::Critical,
            EventKind::UnauthorizedAdminAccess
            | EventKind::CompanyIsolationFailure
            | EventKind::BlockedIpAttempt
            | EventKind::SuspiciousActivity => Severity::High,
            EventKind::FailedAuth
            | EventKind::TokenExpired
            | EventKind::TokenInvalid
            | EventKind::TokenError
            | EventKind::AuthFailure
            | EventKind::AccessDenied
            | EventKind::SuspiciousIpAccess => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

/// An immutable record of one security-relevant occurrence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub kind: EventKind,
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub extra: serde_json::Value,
}

impl SecurityEvent {
    /// Create an event stamped with the current time and its table severity.
    pub fn new(kind: EventKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind,
            severity: kind.severity(),
            ip: None,
            method: None,
            path: None,
            user_id: None,
            tenant_id: None,
            extra: serde_json::Value::Null,
        }
    }

    pub fn ip(mut self, ip: IpAddr) -> Self {
        self.ip = Some(ip);
        self
    }

    pub fn maybe_ip(mut self, ip: Option<IpAddr>) -> Self {
        self.ip = ip;
        self
    }

    pub fn method(mut self, method: &axum::http::Method) -> Self {
        self.method = Some(method.to_string());
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    pub fn extra(mut self, extra: serde_json::Value) -> Self {
        self.extra = extra;
        self
    }
}
