//! Timeout enforcement.
//!
//! Every round trip to an external resource has a deadline. A timed-out
//! call surfaces as `ResourceError::Timeout`, which is transient.

use std::future::Future;
use std::time::Duration;
use tokio::time;

use crate::error::ResourceError;

/// Run `fut` with a deadline.
pub async fn with_deadline<T, F>(limit: Duration, fut: F) -> Result<T, ResourceError>
where
    F: Future<Output = Result<T, ResourceError>>,
{
    match time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(ResourceError::Timeout(limit)),
    }
}
