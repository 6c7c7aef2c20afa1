//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! probes, recoveries, retries, schedulers, request guard
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters and gauges, optional Prometheus endpoint)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing, pretty for local runs
//! - Request ID flows through every HTTP log line via the trace layer
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
