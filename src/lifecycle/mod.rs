//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → HTTP server stops accepting and drains
//!             → health monitor leaves its sweep loop
//!             → service agents stop heartbeating, then deregister
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans the signal out to every long-running task
//! - Tasks own their receiver; nothing polls a global flag

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, recv_shutdown};
pub use signals::wait_for_signal;
