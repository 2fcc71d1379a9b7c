//! Service registry library.
//!
//! In-memory directory where services register, heartbeat and are
//! discovered by name, plus the client used by those services.

pub mod client;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod registry;

pub use config::RegistryConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use registry::Registry;
