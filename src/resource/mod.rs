//! External resource subsystem.
//!
//! # Data Flow
//! ```text
//! Config [[resources]]
//!     → connector.rs (how to open a binding)
//!     → handle.rs (one handle per name, binding recreated in place)
//!     → registry.rs (name → supervisor)
//!     → health/ (probe + recovery act on handles)
//! ```
//!
//! # Design Decisions
//! - Handles live for the whole process; only the binding inside is replaced
//! - Recovery is single-flight per handle
//! - The TCP connector is the built-in binding; anything else plugs in via `Connector`

pub mod connector;
pub mod handle;
pub mod registry;
pub mod tcp;

#[cfg(test)]
pub(crate) mod testing;

pub use connector::{Connection, Connector};
pub use handle::{Liveness, ResourceHandle, ResourceSnapshot};
pub use registry::ResourceRegistry;
pub use tcp::TcpConnector;
