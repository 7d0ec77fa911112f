//! IP admission gate.
//!
//! First stage of the chain: resolves the caller's IP and consults the
//! detector's escalation sets before any other processing. This stage only
//! reads escalation state; it never escalates. Feedback into the detector
//! comes from the audit stage observing response outcomes.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::Mode;
use crate::http::client_ip::{self, ClientIp};
use crate::http::error::GateError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::events::{EventKind, SecurityEvent};

pub async fn ip_gate_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    metrics::record_request();

    let Some(ip) = client_ip::resolve(&req) else {
        // No forwarded header and no peer address (only possible in-process).
        return next.run(req).await;
    };
    req.extensions_mut().insert(ClientIp(ip));

    let method = req.method().clone();
    let path = req.uri().path().to_string();

    match state.config.mode {
        Mode::Development => {
            // Loopback is always admitted so prior local runs cannot lock
            // the developer out.
            if !ip.is_loopback() && state.detector.is_suspicious(ip) {
                state.detector.record(
                    SecurityEvent::new(EventKind::SuspiciousIpAccess)
                        .ip(ip)
                        .method(&method)
                        .path(&path),
                );
            }
            next.run(req).await
        }
        Mode::Production => {
            if state.detector.is_blocked(ip) {
                state.detector.record(
                    SecurityEvent::new(EventKind::BlockedIpAttempt)
                        .ip(ip)
                        .method(&method)
                        .path(&path),
                );
                tracing::warn!(%ip, %path, "rejected request from blocked IP");
                return GateError::IpBlocked.into_response();
            }
            if state.detector.is_suspicious(ip) {
                state.detector.record(
                    SecurityEvent::new(EventKind::SuspiciousIpAccess)
                        .ip(ip)
                        .method(&method)
                        .path(&path),
                );
            }
            next.run(req).await
        }
    }
}
