//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! Sweep timer (monitor.rs):
//!     every sweep_interval
//!     → Registry::sweep_stale(now, liveness_threshold)
//!     → UP records with now - last_heartbeat > threshold become DOWN
//!     → gauges and counters updated
//! ```
//!
//! # Design Decisions
//! - Passive: the registry never calls instances, it only watches heartbeats
//! - Demotion only; revival happens through heartbeat or re-registration
//! - The monitor never removes records

pub mod monitor;

pub use monitor::{HealthMonitor, MonitorHandle};
