//! The seam between the warden and a concrete external resource.

use async_trait::async_trait;

use crate::error::ResourceError;

/// A live binding to an external resource.
#[async_trait]
pub trait Connection: Send + Sync {
    /// One minimal round trip. Must not change server-side state.
    async fn ping(&mut self) -> Result<(), ResourceError>;

    /// Release the binding. Errors are ignored; the binding is discarded either way.
    async fn close(&mut self);
}

/// Produces fresh bindings for one named resource.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn Connection>, ResourceError>;

    /// Human-readable target, used in logs and the admin API.
    fn target(&self) -> String;
}
