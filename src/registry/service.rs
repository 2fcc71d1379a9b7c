//! Registration, heartbeat and discovery operations.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::registry::error::RegistryError;
use crate::registry::instance::{InstanceStatus, Registration, ServiceInstance, instance_id};
use crate::registry::store::{RegistryStore, StatusCounts};

/// An instance demoted by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demotion {
    pub id: String,
    pub elapsed: Duration,
}

/// Shared handle to the service directory.
///
/// Cloning is cheap; all clones observe the same store.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    store: Arc<RegistryStore>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or refresh an instance. Returns the stored record.
    pub fn register(&self, registration: &Registration) -> Result<ServiceInstance, RegistryError> {
        self.register_at(registration, Utc::now())
    }

    pub fn register_at(
        &self,
        registration: &Registration,
        now: DateTime<Utc>,
    ) -> Result<ServiceInstance, RegistryError> {
        let port = registration.validate()?;
        let id = instance_id(&registration.service_name, &registration.host, port);

        let record = self.store.upsert_with(&id, |existing| {
            let mut record = ServiceInstance::new(
                registration.service_name.clone(),
                registration.host.clone(),
                port,
                registration.version.clone(),
                registration.metadata.clone(),
                now,
            );
            if let Some(existing) = existing {
                record.registered_at = existing.registered_at;
            }
            record
        });

        tracing::info!(
            service_id = %record.id,
            service = %record.name,
            address = %format!("{}:{}", record.host, record.port),
            version = %record.version,
            "Service registered"
        );
        Ok(record)
    }

    /// Refresh liveness. Revives `DOWN` records.
    pub fn heartbeat(&self, id: &str) -> Result<ServiceInstance, RegistryError> {
        self.heartbeat_at(id, Utc::now())
    }

    pub fn heartbeat_at(&self, id: &str, now: DateTime<Utc>) -> Result<ServiceInstance, RegistryError> {
        let mut revived = false;
        let record = self
            .store
            .update(id, |r| {
                revived = r.status == InstanceStatus::Down;
                r.touch(now);
            })
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;

        if revived {
            tracing::info!(service_id = %id, "Service back UP after heartbeat");
        } else {
            tracing::trace!(service_id = %id, "Heartbeat received");
        }
        Ok(record)
    }

    /// Remove an instance permanently.
    pub fn deregister(&self, id: &str) -> Result<ServiceInstance, RegistryError> {
        let record = self
            .store
            .remove(id)
            .ok_or_else(|| RegistryError::NotFound(id.to_string()))?;
        tracing::info!(service_id = %id, "Service deregistered");
        Ok(record)
    }

    /// Resolve a service name to one `UP` instance.
    ///
    /// The first match in id order wins; there is no balancing between
    /// instances of the same name.
    pub fn discover(&self, name: &str) -> Result<ServiceInstance, RegistryError> {
        self.store
            .find(|r| r.name == name && r.is_up())
            .ok_or_else(|| RegistryError::NoInstance(name.to_string()))
    }

    /// All records regardless of status.
    pub fn list(&self) -> Vec<ServiceInstance> {
        self.store.snapshot()
    }

    pub fn count(&self) -> usize {
        self.store.len()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.store.status_counts()
    }

    /// Mark every `UP` record whose last heartbeat is older than `threshold` as `DOWN`.
    ///
    /// Records are never removed here. Already-`DOWN` records are left untouched.
    pub fn sweep_stale(&self, now: DateTime<Utc>, threshold: Duration) -> Vec<Demotion> {
        let mut demoted = Vec::new();
        self.store.for_each_mut(|r| {
            if r.is_up() && r.is_stale(now, threshold) {
                r.status = InstanceStatus::Down;
                demoted.push(Demotion {
                    id: r.id.clone(),
                    elapsed: r.elapsed_since_heartbeat(now).unwrap_or_default(),
                });
            }
        });
        demoted
    }
}
