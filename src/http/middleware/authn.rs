//! Bearer credential verification.
//!
//! One terminal outcome per request:
//! 1. Public route       → admit, no identity
//! 2. No credential      → 401 AUTHENTICATION_REQUIRED
//! 3. Failed verification → 401 INVALID_TOKEN (expired / malformed / other
//!    are distinct event kinds for telemetry, identical to the caller)
//! 4. Admin route without the privileged role → 403 ADMIN_ACCESS_REQUIRED
//! 5. Otherwise          → admit with identity attached

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{errors::ErrorKind, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::http::client_ip::ClientIp;
use crate::http::error::GateError;
use crate::http::server::AppState;
use crate::routing::RouteClass;
use crate::security::events::{EventKind, SecurityEvent};

/// Verified caller identity, attached to request extensions on success and
/// echoed into response extensions for the audit stage.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: String,
    pub tenant_id: String,
    pub role: String,
    pub email: Option<String>,
}

/// Raw token claims. `company_id` is the tenant discriminator.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub company_id: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

/// Why a present credential failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenFailure {
    Expired,
    Malformed,
    Other,
}

impl TokenFailure {
    pub fn event_kind(self) -> EventKind {
        match self {
            TokenFailure::Expired => EventKind::TokenExpired,
            TokenFailure::Malformed => EventKind::TokenInvalid,
            TokenFailure::Other => EventKind::TokenError,
        }
    }
}

/// Extract the bearer token from the Authorization header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
}

/// Verify and decode a token into an [`Identity`].
///
/// Decode results missing a required claim (subject, company, role) are
/// rejected here rather than letting a partial identity propagate.
pub fn decode_identity(token: &str, secret: &str) -> Result<Identity, TokenFailure> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    match jsonwebtoken::decode::<Claims>(token, &key, &validation) {
        Ok(data) => {
            let claims = data.claims;
            if claims.sub.is_empty() || claims.company_id.is_empty() || claims.role.is_empty() {
                return Err(TokenFailure::Malformed);
            }
            Ok(Identity {
                user_id: claims.sub,
                tenant_id: claims.company_id,
                role: claims.role,
                email: claims.email,
            })
        }
        Err(e) => match e.kind() {
            ErrorKind::ExpiredSignature => Err(TokenFailure::Expired),
            ErrorKind::InvalidToken
            | ErrorKind::InvalidSignature
            | ErrorKind::MissingRequiredClaim(_)
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => Err(TokenFailure::Malformed),
            _ => Err(TokenFailure::Other),
        },
    }
}

pub async fn authn_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let class = state.classifier.classify(req.method(), req.uri().path());
    let ip = req.extensions().get::<ClientIp>().map(|c| c.0);
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    if class == RouteClass::Public {
        state.detector.record(
            SecurityEvent::new(EventKind::PublicRouteAccess)
                .maybe_ip(ip)
                .method(&method)
                .path(&path),
        );
        return next.run(req).await;
    }

    let Some(token) = bearer_token(req.headers()).map(str::to_owned) else {
        state.detector.record(
            SecurityEvent::new(EventKind::FailedAuth)
                .maybe_ip(ip)
                .method(&method)
                .path(&path)
                .extra(serde_json::json!({ "reason": "no token" })),
        );
        return GateError::CredentialAbsent.into_response();
    };

    let identity = match decode_identity(&token, &state.config.auth.token_secret) {
        Ok(identity) => identity,
        Err(failure) => {
            state.detector.record(
                SecurityEvent::new(failure.event_kind())
                    .maybe_ip(ip)
                    .method(&method)
                    .path(&path),
            );
            return GateError::CredentialInvalid.into_response();
        }
    };

    if class == RouteClass::Admin && identity.role != state.config.auth.privileged_role {
        state.detector.record(
            SecurityEvent::new(EventKind::UnauthorizedAdminAccess)
                .maybe_ip(ip)
                .method(&method)
                .path(&path)
                .user_id(identity.user_id.clone())
                .tenant_id(identity.tenant_id.clone())
                .extra(serde_json::json!({ "role": identity.role })),
        );
        let mut response = GateError::AuthorizationDenied.into_response();
        response.extensions_mut().insert(identity);
        return response;
    }

    state.detector.record(
        SecurityEvent::new(EventKind::SuccessfulAuth)
            .maybe_ip(ip)
            .method(&method)
            .path(&path)
            .user_id(identity.user_id.clone())
            .tenant_id(identity.tenant_id.clone()),
    );

    req.extensions_mut().insert(identity.clone());
    let mut response = next.run(req).await;
    response.extensions_mut().insert(identity);
    response
}
