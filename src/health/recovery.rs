//! Binding recovery.
//!
//! # Sequence
//! ```text
//! close existing binding (if any)
//!     → connect fresh binding (bounded)
//!     → verify with one ping (bounded)
//!     → install, mark healthy
//! ```
//!
//! Safe to run on a healthy handle: it simply replaces the binding and
//! re-verifies. Callers go through `Supervisor::recover`, which serializes
//! recoveries per handle.

use async_trait::async_trait;
use std::time::Duration;
use tokio::time;

use crate::error::RecoveryError;
use crate::resource::{Liveness, ResourceHandle};

#[async_trait]
pub trait RecoveryStrategy: Send + Sync {
    async fn recover(&self, handle: &ResourceHandle) -> Result<(), RecoveryError>;
}

/// Close-then-reconnect.
#[derive(Debug, Clone)]
pub struct Reconnect {
    connect_timeout: Duration,
    verify_timeout: Duration,
}

impl Reconnect {
    pub fn new(connect_timeout: Duration, verify_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            verify_timeout,
        }
    }

    fn fail(handle: &ResourceHandle, error: RecoveryError) -> Result<(), RecoveryError> {
        handle.record(Liveness::Unhealthy, Some(error.to_string()));
        Err(error)
    }
}

#[async_trait]
impl RecoveryStrategy for Reconnect {
    async fn recover(&self, handle: &ResourceHandle) -> Result<(), RecoveryError> {
        let mut binding = handle.binding().await;

        if let Some(mut stale) = binding.take() {
            if time::timeout(self.verify_timeout, stale.close()).await.is_err() {
                tracing::debug!(resource = %handle.name(), "Close timed out, dropping binding");
            }
        }

        let mut fresh = match time::timeout(self.connect_timeout, handle.connector().connect()).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => return Self::fail(handle, RecoveryError::Connect(e.to_string())),
            Err(_) => return Self::fail(handle, RecoveryError::Timeout(self.connect_timeout)),
        };

        match time::timeout(self.verify_timeout, fresh.ping()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                fresh.close().await;
                return Self::fail(handle, RecoveryError::Verify(e.to_string()));
            }
            Err(_) => {
                return Self::fail(handle, RecoveryError::Verify(format!("ping timed out after {:?}", self.verify_timeout)));
            }
        }

        *binding = Some(fresh);
        handle.record(Liveness::Healthy, None);
        Ok(())
    }
}
