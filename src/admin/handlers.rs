//! Admin API handlers.
//!
//! All of these sit under `/admin`, which the route classifier marks ADMIN,
//! so the authn stage has already enforced the privileged role by the time
//! a handler runs.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::net::IpAddr;

use crate::http::server::AppState;
use crate::security::detector::SecurityReport;

pub async fn security_report(State(state): State<AppState>) -> Json<SecurityReport> {
    Json(state.detector.report())
}

#[derive(Debug, Deserialize)]
pub struct UnblockRequest {
    pub ip: IpAddr,
}

pub async fn unblock_ip(
    State(state): State<AppState>,
    Json(body): Json<UnblockRequest>,
) -> impl IntoResponse {
    let removed = state.detector.unblock(body.ip);
    tracing::info!(ip = %body.ip, removed, "admin unblock");
    (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true, "ip": body.ip, "removed": removed })),
    )
}

pub async fn clear_blocks(State(state): State<AppState>) -> impl IntoResponse {
    let (suspicious, blocked) = state.detector.clear_blocks();
    tracing::info!(suspicious, blocked, "admin cleared all escalation state");
    Json(serde_json::json!({
        "success": true,
        "cleared_suspicious": suspicious,
        "cleared_blocked": blocked,
    }))
}
