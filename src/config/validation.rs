//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RegistryConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{MonitorConfig, RegistryConfig};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &RegistryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    if config.monitor.sweep_interval_secs == 0 {
        errors.push(ValidationError::new(
            "monitor.sweep_interval_secs",
            "must be greater than 0",
        ));
    }

    if config.monitor.liveness_threshold_secs == 0 {
        errors.push(ValidationError::new(
            "monitor.liveness_threshold_secs",
            "must be greater than 0",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "'{}' is not a socket address",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Non-fatal advice about the monitor timing, for logging once a subscriber exists.
///
/// A threshold at or below the sweep interval demotes instances that are
/// heartbeating on time.
pub fn liveness_advisory(monitor: &MonitorConfig) -> Option<String> {
    if monitor.liveness_threshold_secs <= monitor.sweep_interval_secs {
        Some(format!(
            "liveness threshold ({}s) does not exceed sweep interval ({}s); instances may flap",
            monitor.liveness_threshold_secs, monitor.sweep_interval_secs
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&RegistryConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = RegistryConfig::default();
        config.listener.bind_address = "nowhere".into();
        config.monitor.sweep_interval_secs = 0;
        config.monitor.liveness_threshold_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "listener.bind_address",
                "monitor.sweep_interval_secs",
                "monitor.liveness_threshold_secs"
            ]
        );
    }

    #[test]
    fn test_metrics_address_checked_only_when_enabled() {
        let mut config = RegistryConfig::default();
        config.observability.metrics_address = "bad".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_liveness_advisory() {
        let mut monitor = MonitorConfig::default();
        assert!(liveness_advisory(&monitor).is_none());

        monitor.sweep_interval_secs = 10;
        monitor.liveness_threshold_secs = 5;
        let advice = liveness_advisory(&monitor).unwrap();
        assert!(advice.contains("(5s)"));
        assert!(advice.contains("(10s)"));

        // equal is still too tight
        monitor.liveness_threshold_secs = 10;
        assert!(liveness_advisory(&monitor).is_some());
    }

    #[test]
    fn test_loaded_config_yields_advisory() {
        let config = crate::config::parse_config(
            "[monitor]\nsweep_interval_secs = 10\nliveness_threshold_secs = 5",
        )
        .unwrap();
        assert!(liveness_advisory(&config.monitor).is_some());
    }
}
