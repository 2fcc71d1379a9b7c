//! Registry store.
//!
//! # Responsibilities
//! - Hold the authoritative set of instance records
//! - Keep every read and write behind one lock
//! - Produce point-in-time snapshots ordered by instance id
//!
//! # Design Decisions
//! - Single `RwLock` over a `BTreeMap`: discovery and listing share the read
//!   side, mutations and the sweep take the write side
//! - Closures run inside the critical section must not block or await
//! - A poisoned lock is fatal

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::registry::instance::{InstanceStatus, ServiceInstance};

/// Per-status record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub up: usize,
    pub down: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.up + self.down
    }
}

/// Concurrent map of instance records keyed by instance id.
#[derive(Debug, Default)]
pub struct RegistryStore {
    entries: RwLock<BTreeMap<String, ServiceInstance>>,
}

impl RegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, ServiceInstance>> {
        self.entries.read().expect("registry store lock poisoned")
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, ServiceInstance>> {
        self.entries.write().expect("registry store lock poisoned")
    }

    /// Insert or replace the record keyed by its id. Returns the previous record.
    pub fn upsert(&self, instance: ServiceInstance) -> Option<ServiceInstance> {
        self.write().insert(instance.id.clone(), instance)
    }

    /// Insert or replace a record built from the current one, in one critical section.
    pub fn upsert_with<F>(&self, id: &str, build: F) -> ServiceInstance
    where
        F: FnOnce(Option<&ServiceInstance>) -> ServiceInstance,
    {
        let mut entries = self.write();
        let record = build(entries.get(id));
        entries.insert(id.to_string(), record.clone());
        record
    }

    pub fn get(&self, id: &str) -> Option<ServiceInstance> {
        self.read().get(id).cloned()
    }

    /// Mutate a record in place. `None` if the id is absent.
    pub fn update<F>(&self, id: &str, f: F) -> Option<ServiceInstance>
    where
        F: FnOnce(&mut ServiceInstance),
    {
        let mut entries = self.write();
        let record = entries.get_mut(id)?;
        f(record);
        Some(record.clone())
    }

    pub fn remove(&self, id: &str) -> Option<ServiceInstance> {
        self.write().remove(id)
    }

    /// First record (in id order) matching the predicate.
    pub fn find<P>(&self, predicate: P) -> Option<ServiceInstance>
    where
        P: Fn(&ServiceInstance) -> bool,
    {
        self.read().values().find(|r| predicate(r)).cloned()
    }

    /// Visit every record mutably under a single write lock.
    pub fn for_each_mut<F>(&self, mut f: F)
    where
        F: FnMut(&mut ServiceInstance),
    {
        for record in self.write().values_mut() {
            f(record);
        }
    }

    /// Consistent copy of all records, ordered by id.
    pub fn snapshot(&self) -> Vec<ServiceInstance> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.read()
            .values()
            .fold(StatusCounts::default(), |mut acc, r| {
                match r.status {
                    InstanceStatus::Up => acc.up += 1,
                    InstanceStatus::Down => acc.down += 1,
                }
                acc
            })
    }
}
