//! Durable sink for CRITICAL security events.
//!
//! Events arrive over an unbounded channel and are appended as one JSON line
//! each to the configured file. Every failure in here is swallowed with a
//! log line: the sink must never influence an admission decision.

use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::security::events::SecurityEvent;

/// Spawn the sink task draining `rx`.
///
/// With no path configured the task still drains the channel so senders
/// never observe backpressure or a closed receiver.
pub fn spawn_sink(path: Option<PathBuf>, mut rx: mpsc::UnboundedReceiver<SecurityEvent>) {
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Some(path) = &path else {
                continue;
            };
            if let Err(e) = append_line(path, &event).await {
                tracing::warn!(error = %e, path = %path.display(), "audit sink write failed");
            }
        }
        tracing::debug!("audit sink channel closed");
    });
}

async fn append_line(path: &PathBuf, event: &SecurityEvent) -> std::io::Result<()> {
    let mut line = serde_json::to_vec(event)?;
    line.push(b'\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    file.write_all(&line).await?;
    file.flush().await?;
    Ok(())
}
