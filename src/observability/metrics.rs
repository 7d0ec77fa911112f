//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gate_requests_total` (counter): requests entering the chain
//! - `gate_responses_total` (counter): responses by status
//! - `gate_denied_total` (counter): denials by code
//! - `gate_security_events_total` (counter): detector events by kind
//! - `gate_blocked_ips` (gauge): current size of the blocked set
//!
//! # Design Decisions
//! - Low-overhead updates (atomic counters via the metrics crate)
//! - Exporter is optional; recording without one installed is a no-op

use metrics::{counter, gauge};

use crate::security::events::EventKind;

pub fn record_request() {
    counter!("gate_requests_total").increment(1);
}

pub fn record_response(status: u16, elapsed_ms: u64) {
    counter!("gate_responses_total", "status" => status.to_string()).increment(1);
    counter!("gate_response_time_ms_total").increment(elapsed_ms);
}

pub fn record_denied(code: &'static str) {
    counter!("gate_denied_total", "code" => code).increment(1);
}

pub fn record_event(kind: EventKind) {
    counter!("gate_security_events_total", "kind" => kind.to_string()).increment(1);
}

pub fn set_blocked_ips(count: usize) {
    gauge!("gate_blocked_ips").set(count as f64);
}

/// Install the Prometheus exporter on its own listener. Failure to bind is
/// logged and otherwise ignored; the gateway runs without metrics.
pub fn install_exporter(address: &str) {
    let addr: std::net::SocketAddr = match address.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!(error = %e, address, "invalid metrics address");
            return;
        }
    };
    if let Err(e) = metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
    {
        tracing::warn!(error = %e, "failed to install metrics exporter");
    } else {
        tracing::info!(address, "metrics exporter listening");
    }
}
