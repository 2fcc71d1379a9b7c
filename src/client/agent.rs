//! Registration lifecycle for a service instance.
//!
//! # Responsibilities
//! - Register once at startup
//! - Heartbeat on a fixed period (with small jitter) while running
//! - Re-register if the registry forgot the instance
//! - On shutdown: stop heartbeating first, then deregister

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::client::registry_client::{ClientError, RegistryClient};
use crate::lifecycle::Shutdown;
use crate::registry::Registration;

pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// A registered instance with its heartbeat task.
pub struct ServiceAgent {
    client: RegistryClient,
    service_id: String,
    shutdown: Shutdown,
    task: JoinHandle<String>,
}

impl ServiceAgent {
    /// Register and start heartbeating every `interval`.
    pub async fn start(
        client: RegistryClient,
        registration: Registration,
        interval: Duration,
    ) -> Result<Self, ClientError> {
        let service_id = client.register(&registration).await?;
        tracing::info!(
            service_id = %service_id,
            service = %registration.service_name,
            "Registered with service registry"
        );

        let shutdown = Shutdown::new();
        let task = tokio::spawn(heartbeat_loop(
            client.clone(),
            registration,
            service_id.clone(),
            interval,
            shutdown.subscribe(),
        ));

        Ok(Self {
            client,
            service_id,
            shutdown,
            task,
        })
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Cancel the heartbeat task, then deregister.
    pub async fn shutdown(self) -> Result<(), ClientError> {
        self.shutdown.trigger();
        let service_id = match self.task.await {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(error = %e, "Heartbeat task failed");
                self.service_id
            }
        };

        self.client.deregister(&service_id).await?;
        tracing::info!(service_id = %service_id, "Deregistered from service registry");
        Ok(())
    }
}

/// Sleep for `interval` plus up to 10% jitter.
fn jittered(interval: Duration) -> Duration {
    let base_ms = interval.as_millis() as u64;
    let jitter_range = base_ms / 10;
    let jitter = if jitter_range > 0 {
        fastrand::u64(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(base_ms + jitter)
}

async fn heartbeat_loop(
    client: RegistryClient,
    registration: Registration,
    mut service_id: String,
    interval: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> String {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(jittered(interval)) => {}
            _ = shutdown.recv() => break,
        }

        match client.heartbeat(&service_id).await {
            Ok(()) => tracing::trace!(service_id = %service_id, "Heartbeat sent"),
            Err(ClientError::NotFound(_)) => {
                tracing::warn!(service_id = %service_id, "Registry lost this instance, re-registering");
                match client.register(&registration).await {
                    Ok(id) => service_id = id,
                    Err(e) => tracing::warn!(error = %e, "Re-registration failed"),
                }
            }
            // the registry only ever sees a missing heartbeat
            Err(e) => tracing::warn!(service_id = %service_id, error = %e, "Heartbeat failed"),
        }
    }
    service_id
}
