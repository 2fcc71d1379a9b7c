//! Periodic staleness sweep.
//!
//! # Responsibilities
//! - Wake on a fixed interval
//! - Demote instances whose heartbeat is older than the liveness threshold
//! - Stop cleanly when shutdown is signalled

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::MonitorConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::registry::Registry;

pub struct HealthMonitor {
    registry: Registry,
    config: MonitorConfig,
}

impl HealthMonitor {
    pub fn new(registry: Registry, config: MonitorConfig) -> Self {
        Self { registry, config }
    }

    /// Spawn the sweep loop with its own shutdown channel.
    pub fn start(self) -> MonitorHandle {
        let shutdown = Shutdown::new();
        let rx = shutdown.subscribe();
        let task = tokio::spawn(self.run(rx));
        MonitorHandle { shutdown, task }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.enabled {
            tracing::info!("Health monitor disabled");
            return;
        }

        tracing::info!(
            interval_secs = self.config.sweep_interval_secs,
            liveness_threshold_secs = self.config.liveness_threshold_secs,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.sweep_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately; nothing can be stale yet
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep();
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Run one sweep against the wall clock.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Utc::now())
    }

    /// Run one sweep as of `now`. Returns the number of demoted instances.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let demoted = self
            .registry
            .sweep_stale(now, self.config.liveness_threshold());

        for d in &demoted {
            tracing::warn!(
                service_id = %d.id,
                elapsed_secs = d.elapsed.as_secs(),
                "Service DOWN: no heartbeat within liveness threshold"
            );
        }

        let counts = self.registry.status_counts();
        tracing::debug!(
            up = counts.up,
            down = counts.down,
            demoted = demoted.len(),
            "Sweep complete"
        );
        metrics::record_sweep(demoted.len());
        metrics::record_instances(counts);

        demoted.len()
    }
}

/// Handle to a running monitor task.
pub struct MonitorHandle {
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Signal the sweep loop and wait for it to exit.
    pub async fn stop(self) {
        self.shutdown.trigger();
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}
