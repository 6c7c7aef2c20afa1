//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → WardenConfig (validated, immutable)
//!
//! process environment
//!     → env.rs (platform activation + external URL)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Environment only decides *whether* schedulers run, never how

pub mod env;
pub mod loader;
pub mod schema;
pub mod validation;

pub use env::PlatformEnv;
pub use loader::{load_config, parse_config, resolve_config, ConfigError};
pub use schema::{
    AdminConfig, BackoffKind, GuardConfig, KeepAliveConfig, ListenerConfig, LogFormat,
    ObservabilityConfig, PlatformConfig, ResourceConfig, RetryConfig, SelfPingConfig, WardenConfig,
};
