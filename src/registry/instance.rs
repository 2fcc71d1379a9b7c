//! Service instance records.
//!
//! # Responsibilities
//! - Represent one registered process of a named service
//! - Derive the deterministic instance id from `(name, host, port)`
//! - Validate incoming registration payloads
//! - Answer the staleness question for the health monitor

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::registry::error::RegistryError;

/// Opaque metadata attached to an instance by its owner.
pub type Metadata = Map<String, Value>;

/// Liveness status of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceStatus {
    Up,
    Down,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Up => "UP",
            InstanceStatus::Down => "DOWN",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the store key for an instance.
pub fn instance_id(name: &str, host: &str, port: u16) -> String {
    format!("{}_{}_{}", name, host, port)
}

/// Registration payload sent by a service at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Registration {
    pub service_name: String,
    pub host: String,
    /// Wider than `u16` so out-of-range ports surface as validation errors.
    pub port: u32,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl Registration {
    pub fn new(service_name: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            service_name: service_name.into(),
            host: host.into(),
            port: u32::from(port),
            version: default_version(),
            metadata: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Check required fields and return the port as a network port.
    pub fn validate(&self) -> Result<u16, RegistryError> {
        if self.service_name.trim().is_empty() {
            return Err(RegistryError::Validation("service_name must not be empty".into()));
        }
        if self.host.trim().is_empty() {
            return Err(RegistryError::Validation("host must not be empty".into()));
        }
        match u16::try_from(self.port) {
            Ok(port) if port != 0 => Ok(port),
            _ => Err(RegistryError::Validation(format!(
                "port {} is outside 1..=65535",
                self.port
            ))),
        }
    }
}

/// One registered process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceInstance {
    #[serde(rename = "service_id")]
    pub id: String,
    #[serde(rename = "service_name")]
    pub name: String,
    pub host: String,
    pub port: u16,
    pub version: String,
    pub status: InstanceStatus,
    pub registered_at: DateTime<Utc>,
    pub last_heartbeat: DateTime<Utc>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl ServiceInstance {
    /// Fresh `UP` record created at `now`.
    pub fn new(
        name: String,
        host: String,
        port: u16,
        version: String,
        metadata: Option<Metadata>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: instance_id(&name, &host, port),
            name,
            host,
            port,
            version,
            status: InstanceStatus::Up,
            registered_at: now,
            last_heartbeat: now,
            metadata,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn is_up(&self) -> bool {
        self.status == InstanceStatus::Up
    }

    /// Time since the last heartbeat. `None` if the heartbeat lies after `now`.
    pub fn elapsed_since_heartbeat(&self, now: DateTime<Utc>) -> Option<Duration> {
        (now - self.last_heartbeat).to_std().ok()
    }

    /// Strictly-greater staleness test: exactly `threshold` is still live.
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        self.elapsed_since_heartbeat(now)
            .is_some_and(|elapsed| elapsed > threshold)
    }

    /// Record a liveness signal.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_heartbeat = now;
        self.status = InstanceStatus::Up;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn instance(now: DateTime<Utc>) -> ServiceInstance {
        ServiceInstance::new(
            "svc-a".into(),
            "127.0.0.1".into(),
            9001,
            "1.0.0".into(),
            None,
            now,
        )
    }

    #[test]
    fn test_instance_id_format() {
        assert_eq!(instance_id("svc-a", "127.0.0.1", 9001), "svc-a_127.0.0.1_9001");
    }

    #[test]
    fn test_url() {
        let inst = instance(Utc::now());
        assert_eq!(inst.url(), "http://127.0.0.1:9001");
        assert_eq!(inst.id, "svc-a_127.0.0.1_9001");
        assert!(inst.is_up());
    }

    #[test]
    fn test_stale_is_strictly_greater() {
        let now = Utc::now();
        let inst = instance(now);
        let ttl = Duration::from_secs(30);

        assert!(!inst.is_stale(now + TimeDelta::seconds(30), ttl));
        assert!(inst.is_stale(now + TimeDelta::milliseconds(30_001), ttl));
        // clock going backwards never demotes
        assert!(!inst.is_stale(now - TimeDelta::seconds(60), ttl));
    }

    #[test]
    fn test_validation() {
        assert_eq!(Registration::new("svc", "localhost", 80).validate(), Ok(80));

        let empty_name = Registration::new("  ", "localhost", 80);
        assert!(matches!(empty_name.validate(), Err(RegistryError::Validation(_))));

        let empty_host = Registration::new("svc", "", 80);
        assert!(matches!(empty_host.validate(), Err(RegistryError::Validation(_))));

        let mut bad_port = Registration::new("svc", "localhost", 80);
        bad_port.port = 70_000;
        assert!(matches!(bad_port.validate(), Err(RegistryError::Validation(_))));
        bad_port.port = 0;
        assert!(matches!(bad_port.validate(), Err(RegistryError::Validation(_))));
    }

    #[test]
    fn test_registration_defaults() {
        let reg: Registration = serde_json::from_str(
            r#"{"service_name":"svc","host":"localhost","port":8080}"#,
        )
        .unwrap();
        assert_eq!(reg.version, "1.0.0");
        assert!(reg.metadata.is_none());
    }

    #[test]
    fn test_metadata_serialized_only_when_set() {
        let bare = serde_json::to_value(Registration::new("svc", "localhost", 80)).unwrap();
        assert!(bare.get("metadata").is_none());

        let mut metadata = Metadata::new();
        metadata.insert("zone".into(), "eu-1".into());
        let tagged = serde_json::to_value(
            Registration::new("svc", "localhost", 80).with_metadata(metadata),
        )
        .unwrap();
        assert_eq!(tagged["metadata"]["zone"], "eu-1");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_value(instance(Utc::now())).unwrap();
        assert_eq!(json["status"], "UP");
        assert_eq!(json["service_id"], "svc-a_127.0.0.1_9001");
        assert_eq!(json["service_name"], "svc-a");
    }
}
