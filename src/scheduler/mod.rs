//! Background scheduling subsystem.
//!
//! # Data Flow
//! ```text
//! periodic.rs (shared skeleton: start/stop, poll quantum, tick isolation)
//!     → keep_alive.rs payload: probe every resource, recover the unhealthy
//!     → self_ping.rs payload:  GET {external_url}/ping
//! ```
//!
//! # Design Decisions
//! - One skeleton, two payloads; only the per-tick work differs
//! - Both run only when the platform activation predicate holds
//! - Each scheduler is an owned value created by the composition root;
//!   there are no process-global instances

pub mod keep_alive;
pub mod periodic;
pub mod self_ping;

use thiserror::Error;

pub use keep_alive::{KeepAlive, KeepAliveScheduler};
pub use periodic::{Payload, PeriodicTask, SchedulerConfig, SchedulerState, SchedulerStatus};
pub use self_ping::{ExternalPingScheduler, SelfPing};

/// Failure of a single tick. Logged, never fatal to the scheduler.
#[derive(Debug, Error)]
pub enum TickError {
    #[error("resources still unhealthy after recovery: {}", .0.join(", "))]
    Unrecovered(Vec<String>),

    #[error("self-ping request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("self-ping returned status {0}")]
    Status(reqwest::StatusCode),
}
