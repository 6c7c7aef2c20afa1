//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → guard.rs (pre-check, dispatch, retry once, fallback)
//!     → health.rs (/health, /ping) | admin API
//!     → response.rs (errors, failure marker, fallback page)
//! ```

pub mod guard;
pub mod health;
pub mod response;
pub mod server;

pub use guard::{RequestGuard, RequestGuardLayer};
pub use response::{fallback_response, AppError, ResourceFailure, FALLBACK_PAGE};
pub use server::{build_router, AppState, WardenServer};
