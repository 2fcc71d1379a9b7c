//! Client side of the registry, used by the services that register.
//!
//! # Data Flow
//! ```text
//! service startup
//!     → ServiceAgent::start (POST /register)
//!     → heartbeat task (POST /heartbeat/{id} every interval)
//! service shutdown
//!     → heartbeat task cancelled
//!     → DELETE /deregister/{id}
//!
//! gateway / consumers
//!     → RegistryClient::discover (GET /discover/{name})
//! ```

pub mod agent;
pub mod registry_client;

pub use agent::{DEFAULT_HEARTBEAT_INTERVAL, ServiceAgent};
pub use registry_client::{ClientError, DEFAULT_REGISTRY_URL, RegistryClient};
