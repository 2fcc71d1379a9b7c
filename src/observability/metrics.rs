//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_requests_total` (counter): requests by method, route, status
//! - `registry_request_duration_seconds` (histogram): latency distribution
//! - `registry_instances` (gauge): records by status
//! - `registry_sweeps_total` (counter): completed health sweeps
//! - `registry_instances_demoted_total` (counter): UP → DOWN transitions

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::registry::StatusCounts;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("registry_requests_total", &labels).increment(1);
    histogram!("registry_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_sweep(demoted: usize) {
    counter!("registry_sweeps_total").increment(1);
    counter!("registry_instances_demoted_total").increment(demoted as u64);
}

pub fn record_instances(counts: StatusCounts) {
    gauge!("registry_instances", "status" => "UP").set(counts.up as f64);
    gauge!("registry_instances", "status" => "DOWN").set(counts.down as f64);
}
