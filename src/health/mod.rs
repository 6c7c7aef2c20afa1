//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Probe (probe.rs):
//!     Ping current binding (bounded)
//!     → Record Healthy / Unhealthy on the handle
//!
//! Recovery (recovery.rs):
//!     Close stale binding
//!     → Connect fresh binding (bounded)
//!     → Verify, install
//!
//! Supervisor (supervisor.rs):
//!     handle + probe + recovery
//!     → single-flight recovery per handle
//! ```
//!
//! # Design Decisions
//! - Probes never reconnect and never return errors
//! - Recovery is idempotent; running it on a healthy handle just re-verifies
//! - All callers share one supervisor per resource

pub mod probe;
pub mod recovery;
pub mod supervisor;

pub use probe::{HealthProbe, PingProbe};
pub use recovery::{Reconnect, RecoveryStrategy};
pub use supervisor::Supervisor;
