//! Denial responses and the gateway error taxonomy.
//!
//! Every denial is an authorization decision, not a transient failure:
//! the pipeline terminates with a structured body and nothing is retried.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::observability::metrics;

/// Structured body returned on every denial.
#[derive(Debug, Serialize)]
pub struct DenialBody {
    pub success: bool,
    pub message: String,
    pub code: &'static str,
}

/// Terminal outcomes of the gating pipeline.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("authentication required")]
    CredentialAbsent,

    #[error("invalid token")]
    CredentialInvalid,

    #[error("admin access required")]
    AuthorizationDenied,

    #[error("company id missing from identity")]
    TenantMissing,

    #[error("access to another company's data denied")]
    TenantMismatch,

    #[error("source IP is blocked")]
    IpBlocked,

    #[error("internal error in {stage}")]
    Internal { stage: &'static str },
}

impl GateError {
    pub fn status(&self) -> StatusCode {
        match self {
            GateError::CredentialAbsent | GateError::CredentialInvalid => {
                StatusCode::UNAUTHORIZED
            }
            GateError::AuthorizationDenied
            | GateError::TenantMissing
            | GateError::TenantMismatch
            | GateError::IpBlocked => StatusCode::FORBIDDEN,
            GateError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            GateError::CredentialAbsent => "AUTHENTICATION_REQUIRED",
            GateError::CredentialInvalid => "INVALID_TOKEN",
            GateError::AuthorizationDenied => "ADMIN_ACCESS_REQUIRED",
            GateError::TenantMissing => "COMPANY_ID_REQUIRED",
            GateError::TenantMismatch => "COMPANY_ACCESS_DENIED",
            GateError::IpBlocked => "IP_BLOCKED",
            GateError::Internal { stage } => match *stage {
                "ip_gate" => "IP_GATE_ERROR",
                "audit" => "AUDIT_ERROR",
                "authn" => "AUTH_ERROR",
                "tenant" => "TENANT_ERROR",
                _ => "INTERNAL_ERROR",
            },
        }
    }
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        if let GateError::Internal { stage } = &self {
            tracing::error!(stage, "internal fault surfaced at middleware boundary");
        }
        metrics::record_denied(self.code());
        let body = DenialBody {
            success: false,
            message: self.to_string(),
            code: self.code(),
        };
        (self.status(), Json(body)).into_response()
    }
}
