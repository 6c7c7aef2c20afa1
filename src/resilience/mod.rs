//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation against a resource:
//!     → timeouts.rs (every round trip has a deadline)
//!     → On transient failure: retries.rs (recover via supervisor, retry)
//!     → backoff.rs (optional pause between attempts)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Retries only for the transient-connection error class
//! - The retry budget is small and fixed; request latency stays bounded

pub mod backoff;
pub mod retries;
pub mod timeouts;

pub use backoff::Backoff;
pub use retries::{run_with_recovery, RetryPolicy, RetryingOperationRunner, RunError};
