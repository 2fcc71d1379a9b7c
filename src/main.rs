//! Service Registry
//!
//! Services register themselves at startup, heartbeat while alive and
//! deregister on shutdown; consumers resolve a service name to an address.
//!
//! # Architecture Overview
//!
//! ```text
//!   service instances                         gateway / consumers
//!   register / heartbeat / deregister         discover / services / health
//!            │                                         │
//!            ▼                                         ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │  http (axum router, request id, trace, timeout, metrics) │
//!   └────────────────────────────┬─────────────────────────────┘
//!                                ▼
//!   ┌──────────────────────────────────────────────────────────┐
//!   │  registry::Registry  ──▶  registry::RegistryStore        │
//!   │                           (RwLock<BTreeMap<id, record>>) │
//!   └────────────────────────────▲─────────────────────────────┘
//!                                │ sweep every interval
//!   ┌────────────────────────────┴─────────────────────────────┐
//!   │  health::HealthMonitor (UP → DOWN after liveness ttl)     │
//!   └──────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use service_registry::config::{self, RegistryConfig, validation};
use service_registry::lifecycle::{Shutdown, wait_for_signal};
use service_registry::observability::{logging, metrics};
use service_registry::HttpServer;

#[derive(Parser)]
#[command(name = "service-registry")]
#[command(about = "Service registry with heartbeat-based liveness", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => RegistryConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability)?;

    tracing::info!("service-registry v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        sweep_interval_secs = config.monitor.sweep_interval_secs,
        liveness_threshold_secs = config.monitor.liveness_threshold_secs,
        "Configuration loaded"
    );
    if let Some(advice) = validation::liveness_advisory(&config.monitor) {
        tracing::warn!(
            liveness_threshold_secs = config.monitor.liveness_threshold_secs,
            sweep_interval_secs = config.monitor.sweep_interval_secs,
            "{}",
            advice
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let server = HttpServer::new(config);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
