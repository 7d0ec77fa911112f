//! Sliding-window anomaly detection over security events.
//!
//! # Responsibilities
//! - Retain a capped, per-kind log of security events
//! - Count same-kind events per source IP over sliding windows
//! - Escalate abusive IPs: observed -> suspicious -> blocked
//! - Produce the security report consumed by the admin API
//!
//! # Design Decisions
//! - One mutex guards logs and both escalation sets, so the
//!   append-count-escalate sequence is atomic with respect to concurrent
//!   recording and the periodic sweep
//! - Escalation set insertion is idempotent; the escalation events
//!   (suspicious_activity, ip_blocked) are emitted on transition only
//! - CRITICAL events are forwarded to the durable sink over an unbounded
//!   channel; send failures are logged and never affect admission

use chrono::{Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::IpAddr;
use std::sync::Mutex;
use tokio::sync::mpsc;

use crate::config::schema::DetectorConfig;
use crate::observability::metrics;
use crate::security::events::{EventKind, SecurityEvent, Severity};

/// Snapshot returned by [`AnomalyDetector::report`].
#[derive(Debug, Clone, Serialize)]
pub struct SecurityReport {
    pub total_events: usize,
    pub events_by_type: HashMap<EventKind, usize>,
    pub suspicious_ips: Vec<IpAddr>,
    pub blocked_ips: Vec<IpAddr>,
    pub recent_critical_events: Vec<SecurityEvent>,
}

/// Counts from one sweep pass, for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepStats {
    pub events_dropped: usize,
    pub ips_cleared: usize,
}

struct DetectorState {
    logs: HashMap<EventKind, VecDeque<SecurityEvent>>,
    suspicious: HashSet<IpAddr>,
    blocked: HashSet<IpAddr>,
}

/// Process-local intrusion-style detector.
///
/// Owned by [`crate::http::server::AppState`] and shared via `Arc`; state is
/// deliberately not distributed.
pub struct AnomalyDetector {
    config: DetectorConfig,
    state: Mutex<DetectorState>,
    critical_tx: Option<mpsc::UnboundedSender<SecurityEvent>>,
}

impl AnomalyDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self {
            config,
            state: Mutex::new(DetectorState {
                logs: HashMap::new(),
                suspicious: HashSet::new(),
                blocked: HashSet::new(),
            }),
            critical_tx: None,
        }
    }

    /// Attach the durable sink channel for CRITICAL events.
    pub fn with_critical_sink(mut self, tx: mpsc::UnboundedSender<SecurityEvent>) -> Self {
        self.critical_tx = Some(tx);
        self
    }

    /// Record an event and run threshold escalation for its source IP.
    ///
    /// The append, the window count, and any escalation happen under one
    /// lock acquisition.
    pub fn record(&self, event: SecurityEvent) {
        let kind = event.kind;
        let ip = event.ip;
        let timestamp = event.timestamp;

        let mut state = self.state.lock().expect("detector mutex poisoned");
        self.append_locked(&mut state, event);

        let (Some(ip), Some(threshold)) = (ip, self.config.thresholds.get(&kind)) else {
            return;
        };

        let window_start =
            timestamp - ChronoDuration::seconds(threshold.window_secs.min(i64::MAX as u64) as i64);
        let n = state
            .logs
            .get(&kind)
            .map(|log| {
                log.iter()
                    .filter(|e| e.ip == Some(ip) && e.timestamp >= window_start)
                    .count()
            })
            .unwrap_or(0);

        if n >= threshold.count && state.suspicious.insert(ip) {
            tracing::warn!(%ip, kind = %kind, count = n, "IP escalated to suspicious");
            let escalation = SecurityEvent::new(EventKind::SuspiciousActivity)
                .ip(ip)
                .extra(serde_json::json!({ "trigger": kind.to_string(), "count": n }));
            self.append_locked(&mut state, escalation);
        }

        if n >= threshold.count * 2 && state.blocked.insert(ip) {
            tracing::warn!(%ip, kind = %kind, count = n, "IP escalated to blocked");
            metrics::set_blocked_ips(state.blocked.len());
            let escalation = SecurityEvent::new(EventKind::IpBlocked)
                .ip(ip)
                .extra(serde_json::json!({ "trigger": kind.to_string(), "count": n }));
            self.append_locked(&mut state, escalation);
        }
    }

    /// Append to the per-kind log, evicting FIFO past the cap, and forward
    /// CRITICAL events to the sink.
    fn append_locked(&self, state: &mut DetectorState, event: SecurityEvent) {
        metrics::record_event(event.kind);

        if event.severity == Severity::Critical {
            if let Some(tx) = &self.critical_tx {
                if tx.send(event.clone()).is_err() {
                    tracing::warn!(kind = %event.kind, "critical event sink is gone; dropping");
                }
            }
        }

        let log = state.logs.entry(event.kind).or_default();
        log.push_back(event);
        while log.len() > self.config.max_events_per_type {
            log.pop_front();
        }
    }

    pub fn is_blocked(&self, ip: IpAddr) -> bool {
        self.state
            .lock()
            .expect("detector mutex poisoned")
            .blocked
            .contains(&ip)
    }

    pub fn is_suspicious(&self, ip: IpAddr) -> bool {
        self.state
            .lock()
            .expect("detector mutex poisoned")
            .suspicious
            .contains(&ip)
    }

    /// Remove an IP from both escalation sets. Returns true if it was present
    /// in either.
    pub fn unblock(&self, ip: IpAddr) -> bool {
        let mut state = self.state.lock().expect("detector mutex poisoned");
        let removed = state.blocked.remove(&ip) | state.suspicious.remove(&ip);
        metrics::set_blocked_ips(state.blocked.len());
        removed
    }

    /// Clear both escalation sets. Returns (suspicious, blocked) counts
    /// cleared.
    pub fn clear_blocks(&self) -> (usize, usize) {
        let mut state = self.state.lock().expect("detector mutex poisoned");
        let counts = (state.suspicious.len(), state.blocked.len());
        state.suspicious.clear();
        state.blocked.clear();
        metrics::set_blocked_ips(0);
        counts
    }

    /// Snapshot of totals, escalation sets, and CRITICAL events from the
    /// last 24 hours.
    pub fn report(&self) -> SecurityReport {
        let state = self.state.lock().expect("detector mutex poisoned");
        let cutoff = Utc::now() - ChronoDuration::hours(24);

        let mut events_by_type = HashMap::new();
        let mut total_events = 0;
        let mut recent_critical_events = Vec::new();
        for (kind, log) in &state.logs {
            events_by_type.insert(*kind, log.len());
            total_events += log.len();
            recent_critical_events.extend(
                log.iter()
                    .filter(|e| e.severity == Severity::Critical && e.timestamp >= cutoff)
                    .cloned(),
            );
        }
        recent_critical_events.sort_by_key(|e| e.timestamp);

        SecurityReport {
            total_events,
            events_by_type,
            suspicious_ips: state.suspicious.iter().copied().collect(),
            blocked_ips: state.blocked.iter().copied().collect(),
            recent_critical_events,
        }
    }

    /// Drop events past retention and clear both escalation sets.
    ///
    /// The full clear of the sets (rather than per-IP expiry) matches the
    /// amnesty policy this gateway ships with. Idempotent.
    pub fn sweep(&self) -> SweepStats {
        let mut state = self.state.lock().expect("detector mutex poisoned");
        let cutoff = Utc::now()
            - ChronoDuration::seconds(
                self.config.event_retention_secs.min(i64::MAX as u64) as i64
            );

        let mut events_dropped = 0;
        for log in state.logs.values_mut() {
            let before = log.len();
            log.retain(|e| e.timestamp >= cutoff);
            events_dropped += before - log.len();
        }

        let ips_cleared = state.suspicious.len() + state.blocked.len();
        state.suspicious.clear();
        state.blocked.clear();
        metrics::set_blocked_ips(0);

        SweepStats {
            events_dropped,
            ips_cleared,
        }
    }
}
