//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the warden.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::Backoff;
use crate::scheduler::SchedulerConfig;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct WardenConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// External resources to keep alive.
    pub resources: Vec<ResourceConfig>,

    /// Retry policy for operations on the request path.
    pub retry: RetryConfig,

    /// Background keep-alive settings.
    pub keep_alive: KeepAliveConfig,

    /// Background self-ping settings.
    pub self_ping: SelfPingConfig,

    /// Hosting platform detection.
    pub platform: PlatformConfig,

    /// Per-request guard settings.
    pub guard: GuardConfig,

    pub admin: AdminConfig,

    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Request timeout (total time for request/response) in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// One external resource.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Unique resource identifier.
    pub name: String,

    /// Resource address (e.g., "db.internal:5432").
    pub address: String,

    /// Connection establishment timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Liveness probe timeout in milliseconds.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

impl ResourceConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

/// Backoff flavour between retry attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    #[default]
    None,
    Fixed,
    Exponential,
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per operation (at least 1).
    pub max_attempts: u32,

    pub backoff: BackoffKind,

    /// Fixed delay, or the exponential base, in milliseconds.
    pub base_delay_ms: u64,

    /// Exponential cap in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            backoff: BackoffKind::None,
            base_delay_ms: 100,
            max_delay_ms: 2_000,
        }
    }
}

impl RetryConfig {
    pub fn backoff(&self) -> Backoff {
        match self.backoff {
            BackoffKind::None => Backoff::None,
            BackoffKind::Fixed => Backoff::Fixed(Duration::from_millis(self.base_delay_ms)),
            BackoffKind::Exponential => Backoff::Exponential {
                base: Duration::from_millis(self.base_delay_ms),
                max: Duration::from_millis(self.max_delay_ms),
            },
        }
    }
}

/// Keep-alive scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Seconds between keep-alive cycles.
    pub interval_secs: u64,

    /// Cancellation is observed at least this often, in seconds.
    pub poll_quantum_secs: u64,

    /// How long `stop()` waits for the task, in seconds.
    pub join_timeout_secs: u64,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            interval_secs: 240,
            poll_quantum_secs: 10,
            join_timeout_secs: 5,
        }
    }
}

impl KeepAliveConfig {
    pub fn scheduler(&self, enabled: bool) -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_secs(self.interval_secs))
            .poll_quantum(Duration::from_secs(self.poll_quantum_secs))
            .join_timeout(Duration::from_secs(self.join_timeout_secs))
            .enabled(enabled)
    }
}

/// Self-ping scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelfPingConfig {
    /// Seconds between pings. Must stay below the platform idle timeout.
    pub interval_secs: u64,

    pub poll_quantum_secs: u64,

    pub join_timeout_secs: u64,

    /// Outbound request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Path appended to the external base URL.
    pub path: String,
}

impl Default for SelfPingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 420,
            poll_quantum_secs: 10,
            join_timeout_secs: 5,
            request_timeout_secs: 30,
            path: "/ping".to_string(),
        }
    }
}

impl SelfPingConfig {
    pub fn scheduler(&self, enabled: bool) -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_secs(self.interval_secs))
            .poll_quantum(Duration::from_secs(self.poll_quantum_secs))
            .join_timeout(Duration::from_secs(self.join_timeout_secs))
            .enabled(enabled)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Hosting platform detection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Boolean-like variable whose presence means "running on the platform".
    pub activation_env: String,

    /// Variable holding the externally reachable base URL.
    pub external_url_env: String,

    /// Seconds of inactivity after which the platform idles the process.
    pub idle_timeout_secs: u64,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            activation_env: "RENDER".to_string(),
            external_url_env: "RENDER_EXTERNAL_URL".to_string(),
            idle_timeout_secs: 900,
        }
    }
}

/// Request guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GuardConfig {
    pub enabled: bool,

    /// Largest request body buffered for a retry, in bytes.
    pub max_body_bytes: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Admin API configuration. An empty key disables the admin API.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AdminConfig {
    pub api_key: String,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,

    /// Expose a Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
