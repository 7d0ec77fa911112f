//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the gating middleware chain
//! - Own the shared state (config, detector, classifier)
//! - Spawn the audit sink and sweep tasks
//! - Bind the server and serve with graceful shutdown
//!
//! # Design Decisions
//! - The detector is one owned instance injected through AppState; no
//!   ambient globals
//! - Middleware layers are added innermost-first, so the IP gate is the
//!   first stage a request meets
//! - The business handlers mounted here are a minimal demo surface; real
//!   deployments replace them and keep the chain

use axum::{
    extract::Path,
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::admin;
use crate::config::schema::GatewayConfig;
use crate::http::error::GateError;
use crate::http::middleware::{
    audit_middleware, authn_middleware, ip_gate_middleware, tenant_guard_middleware, Identity,
    TenantContext,
};
use crate::observability::metrics;
use crate::routing::RouteClassifier;
use crate::security::detector::AnomalyDetector;
use crate::security::events::SecurityEvent;
use crate::security::{sink, sweep};

/// Application state injected into middlewares and handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub detector: Arc<AnomalyDetector>,
    pub classifier: Arc<RouteClassifier>,
}

impl AppState {
    /// Build state plus the receiving end of the CRITICAL-event channel.
    /// The caller decides where the receiver drains (sink task in
    /// production, inspected directly in tests).
    pub fn new(config: GatewayConfig) -> (Self, mpsc::UnboundedReceiver<SecurityEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let classifier = Arc::new(RouteClassifier::from_config(&config.routes));
        let detector =
            Arc::new(AnomalyDetector::new(config.detector.clone()).with_critical_sink(tx));
        (
            Self {
                config: Arc::new(config),
                detector,
                classifier,
            },
            rx,
        )
    }
}

/// The gateway HTTP server.
pub struct GatewayServer {
    state: AppState,
    router: Router,
    critical_rx: mpsc::UnboundedReceiver<SecurityEvent>,
}

impl GatewayServer {
    /// Create a new server from validated configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let (state, critical_rx) = AppState::new(config);
        let router = build_router(state.clone());
        Self {
            state,
            router,
            critical_rx,
        }
    }

    /// Shared state, exposed for tests and embedding.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server on the given listener until shutdown is signalled.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
        shutdown_for_tasks: broadcast::Receiver<()>,
    ) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mode = ?self.state.config.mode, "gateway starting");

        sink::spawn_sink(
            self.state
                .config
                .audit_log
                .path
                .as_ref()
                .map(std::path::PathBuf::from),
            self.critical_rx,
        );
        sweep::spawn_sweeper(
            self.state.detector.clone(),
            Duration::from_secs(self.state.config.detector.sweep_interval_secs),
            shutdown_for_tasks,
        );

        if self.state.config.observability.metrics_enabled {
            metrics::install_exporter(&self.state.config.observability.metrics_address);
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("gateway stopped");
        Ok(())
    }
}

/// Assemble the router: demo business surface + admin API, wrapped by the
/// four gate stages. Layers are added innermost-first; the IP gate (added
/// last) sees the request first.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/profile", get(profile))
        .route("/api/companies/{company_id}/orders", get(company_orders))
        .merge(admin::router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            tenant_guard_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            authn_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            audit_middleware,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            ip_gate_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// Convert a handler panic into the structured 500 denial instead of
/// letting the connection drop.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(detail = %detail, "request handler panicked");
    GateError::Internal { stage: "pipeline" }.into_response()
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn profile(Extension(identity): Extension<Identity>) -> impl IntoResponse {
    Json(serde_json::json!({
        "success": true,
        "user_id": identity.user_id,
        "company_id": identity.tenant_id,
        "role": identity.role,
        "email": identity.email,
    }))
}

async fn company_orders(
    Path(company_id): Path<String>,
    Extension(tenant): Extension<TenantContext>,
) -> impl IntoResponse {
    // Demo handler: echoes the tenant context the guard attached.
    Json(serde_json::json!({
        "success": true,
        "company_id": company_id,
        "tenant_context": tenant.tenant_id,
        "orders": [],
    }))
}
