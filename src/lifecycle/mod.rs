//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config + platform env → Registry → Schedulers → Services
//!     → Initial connect (best effort) → Start schedulers
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Cancel token → Server drains → Stop schedulers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - `Services` is the single composition root; nothing is global
//! - Resources that are down at boot do not block startup; the guard and
//!   keep-alive recover them later
//! - Scheduler shutdown is bounded by each scheduler's join timeout

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::wait_for_signal;
pub use startup::{Services, StartupError};
