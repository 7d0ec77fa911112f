//! Periodic sweep of detector state.
//!
//! Runs on a fixed interval, drops events past retention, and clears both
//! escalation sets. The sweep itself runs under the detector's mutex; the
//! in-flight flag only guards against a slow sweep overlapping the next tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

use crate::security::detector::AnomalyDetector;

/// Spawn the background sweep task.
pub fn spawn_sweeper(
    detector: Arc<AnomalyDetector>,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let in_flight = Arc::new(AtomicBool::new(false));

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // First tick fires immediately; skip it so startup is not a sweep.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if in_flight.swap(true, Ordering::AcqRel) {
                        tracing::warn!("sweep still in flight; skipping tick");
                        continue;
                    }
                    let stats = detector.sweep();
                    in_flight.store(false, Ordering::Release);
                    tracing::info!(
                        events_dropped = stats.events_dropped,
                        ips_cleared = stats.ips_cleared,
                        "detector sweep complete"
                    );
                }
                _ = shutdown.recv() => {
                    tracing::debug!("sweep task shutting down");
                    break;
                }
            }
        }
    });
}
