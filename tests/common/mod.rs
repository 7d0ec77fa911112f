//! Shared utilities for integration testing the gating chain.
#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use gatekeeper::config::{GatewayConfig, Mode};
use gatekeeper::http::{build_router, AppState};
use gatekeeper::security::SecurityEvent;

pub const SECRET: &str = "integration-secret";

/// A router plus the shared state behind it, so tests can inspect the
/// detector directly and drain the CRITICAL-event channel.
pub struct TestGate {
    pub router: Router,
    pub state: AppState,
    pub critical_rx: mpsc::UnboundedReceiver<SecurityEvent>,
}

pub fn config(mode: Mode) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.mode = mode;
    config.auth.token_secret = SECRET.into();
    config
}

pub fn gate(config: GatewayConfig) -> TestGate {
    let (state, critical_rx) = AppState::new(config);
    TestGate {
        router: build_router(state.clone()),
        state,
        critical_rx,
    }
}

#[derive(serde::Serialize)]
struct TestClaims<'a> {
    sub: &'a str,
    company_id: &'a str,
    role: &'a str,
    email: &'a str,
    exp: i64,
}

/// Mint a valid bearer token for the given caller.
pub fn token(sub: &str, company_id: &str, role: &str) -> String {
    token_with_exp(sub, company_id, role, chrono::Utc::now().timestamp() + 3600)
}

pub fn token_with_exp(sub: &str, company_id: &str, role: &str, exp: i64) -> String {
    encode(
        &Header::default(),
        &TestClaims {
            sub,
            company_id,
            role,
            email: "caller@example.com",
            exp,
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// Request builder with the caller IP set via the forwarded header.
pub fn request(method: &str, path: &str, ip: &str) -> axum::http::request::Builder {
    Request::builder()
        .method(method)
        .uri(path)
        .header("x-forwarded-for", ip)
}

/// Send a request through the full chain; returns status and parsed body.
pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Convenience: GET with an optional bearer token.
pub async fn get(
    router: &Router,
    path: &str,
    ip: &str,
    bearer: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = request("GET", path, ip);
    if let Some(t) = bearer {
        builder = builder.header("authorization", format!("Bearer {t}"));
    }
    send(router, builder.body(Body::empty()).unwrap()).await
}
