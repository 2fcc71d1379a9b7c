//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use service_registry::client::RegistryClient;
use service_registry::config::RegistryConfig;
use service_registry::http::HttpServer;
use service_registry::lifecycle::Shutdown;
use service_registry::registry::Registry;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// A registry server running on an ephemeral port.
pub struct TestRegistry {
    pub addr: SocketAddr,
    pub registry: Registry,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl TestRegistry {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> RegistryClient {
        RegistryClient::with_http_client(&self.url(), http_client()).unwrap()
    }

    pub async fn stop(self) {
        self.shutdown.trigger();
        let _ = tokio::time::timeout(Duration::from_secs(5), self.task).await;
    }
}

/// Config with a fast monitor for liveness tests.
pub fn fast_monitor_config(interval_secs: u64, threshold_secs: u64) -> RegistryConfig {
    let mut config = RegistryConfig::default();
    config.monitor.sweep_interval_secs = interval_secs;
    config.monitor.liveness_threshold_secs = threshold_secs;
    config
}

/// Start a registry server and wait until it answers `/health`.
pub async fn start_registry(config: RegistryConfig) -> TestRegistry {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(config);
    let registry = server.registry().clone();
    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();

    let task = tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = http_client();
    for _ in 0..50 {
        if client
            .get(format!("http://{}/health", addr))
            .send()
            .await
            .is_ok()
        {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    TestRegistry {
        addr,
        registry,
        shutdown,
        task,
    }
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder().no_proxy().build().unwrap()
}
