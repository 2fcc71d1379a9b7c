//! Stop signal shared by the registry's background work.
//!
//! One `trigger` reaches every subscriber:
//! - `HttpServer::run` stops accepting, drains in-flight requests for at most
//!   the configured grace period, then stops the sweep loop.
//! - `HealthMonitor` owns a private `Shutdown` behind its `MonitorHandle`, so a
//!   sweep loop can be stopped without touching the server.
//! - `ServiceAgent` does the same for its heartbeat task, which must end before
//!   the instance deregisters.

use tokio::sync::broadcast;

/// Fan-out stop signal.
///
/// Clones share one channel. Receivers created after `trigger` has fired do
/// not see it, so subscribe before spawning the task that listens.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        // A single slot is enough: every receiver only cares that one value arrived.
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Repeated calls are harmless.
    pub fn trigger(&self) {
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::debug!(listeners, "Shutdown triggered");
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Wait until `rx` sees the stop signal.
///
/// Also returns when every `Shutdown` clone has been dropped, since the
/// signal can then never arrive.
pub async fn recv_shutdown(mut rx: broadcast::Receiver<()>) {
    let _ = rx.recv().await;
}
