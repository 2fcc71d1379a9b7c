//! Service registry core.
//!
//! # Data Flow
//! ```text
//! register(name, host, port)
//!     → instance.rs (validate, derive id = name_host_port)
//!     → store.rs (upsert under write lock)
//!
//! heartbeat(id) / deregister(id)
//!     → store.rs (update / remove, NotFound if absent)
//!
//! discover(name) / list()
//!     → store.rs (read lock, first UP match / snapshot)
//!
//! health monitor sweep
//!     → service.rs sweep_stale (one write-locked scan, UP → DOWN)
//! ```
//!
//! # State Machine
//! ```text
//! (none) --register--> UP --sweep: elapsed > ttl--> DOWN
//!                      UP <--------heartbeat-------- DOWN
//! deregister removes from either state.
//! ```
//!
//! # Design Decisions
//! - Nothing is persisted; a restart starts from an empty directory
//! - DOWN records stay until explicitly deregistered
//! - Time is passed in explicitly so sweeps are deterministic under test

pub mod error;
pub mod instance;
pub mod service;
pub mod store;

pub use error::RegistryError;
pub use instance::{InstanceStatus, Metadata, Registration, ServiceInstance, instance_id};
pub use service::{Demotion, Registry};
pub use store::{RegistryStore, StatusCounts};
