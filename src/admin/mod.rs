//! Admin API for the security report and IP remediation.
//!
//! Routes here are protected by classification, not a separate key: the
//! default route config lists `/admin/*` as ADMIN, and the authn stage
//! rejects callers without the privileged role before these handlers run.

pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::http::server::AppState;
use self::handlers::{clear_blocks, security_report, unblock_ip};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/security/report", get(security_report))
        .route("/admin/security/unblock", post(unblock_ip))
        .route("/admin/security/blocks/clear", post(clear_blocks))
}
