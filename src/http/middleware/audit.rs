//! Request/response audit.
//!
//! Wraps everything after the IP gate. Records a LOW `request_received`
//! event on the way in (volumetric visibility only; the kind carries no
//! escalation threshold) and, for error-status responses, feeds a typed
//! event back into the detector. That feedback is what drives escalation.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use std::time::Instant;

use crate::http::client_ip::ClientIp;
use crate::http::middleware::authn::Identity;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::events::{EventKind, SecurityEvent};

pub async fn audit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let start = Instant::now();
    let ip = req.extensions().get::<ClientIp>().map(|c| c.0);
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    state.detector.record(
        SecurityEvent::new(EventKind::RequestReceived)
            .maybe_ip(ip)
            .method(&method)
            .path(&path),
    );

    let response = next.run(req).await;
    let status = response.status();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    metrics::record_response(status.as_u16(), elapsed_ms);

    if status.as_u16() >= 400 {
        let kind = match status.as_u16() {
            401 => EventKind::AuthFailure,
            403 => EventKind::AccessDenied,
            _ => EventKind::ErrorResponse,
        };
        let mut event = SecurityEvent::new(kind)
            .maybe_ip(ip)
            .method(&method)
            .path(&path)
            .extra(serde_json::json!({
                "status": status.as_u16(),
                "elapsed_ms": elapsed_ms,
            }));
        // The authn stage echoes the verified identity back through
        // response extensions so denials can be attributed.
        if let Some(identity) = response.extensions().get::<Identity>() {
            event = event
                .user_id(identity.user_id.clone())
                .tenant_id(identity.tenant_id.clone());
        }
        state.detector.record(event);
    }

    response
}
