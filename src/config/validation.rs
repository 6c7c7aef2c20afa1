//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, attempts >= 1, addresses parse)
//! - Keep the self-ping cadence under the platform idle timeout
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: WardenConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::WardenConfig;

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub fn validate_config(config: &WardenConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new("listener.bind_address", "not a socket address"));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new("listener.request_timeout_secs", "must be greater than 0"));
    }

    let mut seen = HashSet::new();
    for (i, resource) in config.resources.iter().enumerate() {
        let field = |name: &str| format!("resources[{}].{}", i, name);
        if resource.name.trim().is_empty() {
            errors.push(ValidationError::new(field("name"), "must not be empty"));
        } else if !seen.insert(resource.name.as_str()) {
            errors.push(ValidationError::new(field("name"), format!("duplicate resource '{}'", resource.name)));
        }
        if resource.address.trim().is_empty() {
            errors.push(ValidationError::new(field("address"), "must not be empty"));
        }
        if resource.connect_timeout_ms == 0 {
            errors.push(ValidationError::new(field("connect_timeout_ms"), "must be greater than 0"));
        }
        if resource.probe_timeout_ms == 0 {
            errors.push(ValidationError::new(field("probe_timeout_ms"), "must be greater than 0"));
        }
    }

    if config.retry.max_attempts == 0 {
        errors.push(ValidationError::new("retry.max_attempts", "must be at least 1"));
    }
    if config.retry.base_delay_ms > config.retry.max_delay_ms {
        errors.push(ValidationError::new("retry.base_delay_ms", "must not exceed retry.max_delay_ms"));
    }

    check_schedule(
        &mut errors,
        "keep_alive",
        config.keep_alive.interval_secs,
        config.keep_alive.poll_quantum_secs,
        config.keep_alive.join_timeout_secs,
    );
    check_schedule(
        &mut errors,
        "self_ping",
        config.self_ping.interval_secs,
        config.self_ping.poll_quantum_secs,
        config.self_ping.join_timeout_secs,
    );

    if config.self_ping.request_timeout_secs == 0 {
        errors.push(ValidationError::new("self_ping.request_timeout_secs", "must be greater than 0"));
    }
    if !config.self_ping.path.starts_with('/') {
        errors.push(ValidationError::new("self_ping.path", "must start with '/'"));
    }
    if config.self_ping.interval_secs >= config.platform.idle_timeout_secs {
        errors.push(ValidationError::new(
            "self_ping.interval_secs",
            format!(
                "must be shorter than platform.idle_timeout_secs ({})",
                config.platform.idle_timeout_secs
            ),
        ));
    }
    if config.platform.activation_env.is_empty() {
        errors.push(ValidationError::new("platform.activation_env", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new("observability.metrics_address", "not a socket address"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_schedule(errors: &mut Vec<ValidationError>, section: &str, interval: u64, quantum: u64, join: u64) {
    if interval == 0 {
        errors.push(ValidationError::new(format!("{}.interval_secs", section), "must be greater than 0"));
    }
    if quantum == 0 {
        errors.push(ValidationError::new(format!("{}.poll_quantum_secs", section), "must be greater than 0"));
    } else if quantum > interval {
        errors.push(ValidationError::new(
            format!("{}.poll_quantum_secs", section),
            "must not exceed interval_secs",
        ));
    }
    if join == 0 {
        errors.push(ValidationError::new(format!("{}.join_timeout_secs", section), "must be greater than 0"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ResourceConfig;

    fn resource(name: &str) -> ResourceConfig {
        ResourceConfig {
            name: name.to_string(),
            address: "127.0.0.1:5432".to_string(),
            connect_timeout_ms: 1000,
            probe_timeout_ms: 1000,
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&WardenConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = WardenConfig::default();
        config.retry.max_attempts = 0;
        config.keep_alive.interval_secs = 0;
        config.listener.bind_address = "nope".to_string();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"retry.max_attempts"));
        assert!(fields.contains(&"keep_alive.interval_secs"));
        assert!(fields.contains(&"listener.bind_address"));
    }

    #[test]
    fn test_quantum_must_fit_interval() {
        let mut config = WardenConfig::default();
        config.keep_alive.interval_secs = 5;
        config.keep_alive.poll_quantum_secs = 10;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "keep_alive.poll_quantum_secs");
    }

    #[test]
    fn test_self_ping_must_beat_idle_timeout() {
        let mut config = WardenConfig::default();
        config.self_ping.interval_secs = 900;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "self_ping.interval_secs");
    }

    #[test]
    fn test_duplicate_resource_names() {
        let mut config = WardenConfig::default();
        config.resources = vec![resource("db"), resource("db")];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("duplicate"));
    }
}
