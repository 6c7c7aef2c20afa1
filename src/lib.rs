//! Resilient connections to stateful external resources.
//!
//! Health probes, single-flight recovery, bounded retry, a per-request
//! guard and two background schedulers (keep-alive and self-ping), plus
//! the liveness endpoints operational tooling polls.

pub mod admin;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod resource;
pub mod scheduler;

pub use config::schema::WardenConfig;
pub use error::{Classify, ErrorClass, RecoveryError, ResourceError};
pub use http::WardenServer;
pub use lifecycle::{Services, Shutdown};
