//! Per-resource supervisor.
//!
//! Bundles a handle with its probe and recovery strategy. Everything that
//! checks or repairs a resource (request guard, retry runner, keep-alive)
//! goes through here, so recovery is always serialized per handle.

use std::sync::Arc;
use std::time::Duration;

use crate::error::RecoveryError;
use crate::health::probe::{HealthProbe, PingProbe};
use crate::health::recovery::{Reconnect, RecoveryStrategy};
use crate::observability::metrics;
use crate::resource::{Liveness, ResourceHandle};

#[derive(Clone)]
pub struct Supervisor {
    handle: Arc<ResourceHandle>,
    probe: Arc<dyn HealthProbe>,
    strategy: Arc<dyn RecoveryStrategy>,
}

impl Supervisor {
    pub fn new(
        handle: Arc<ResourceHandle>,
        probe: Arc<dyn HealthProbe>,
        strategy: Arc<dyn RecoveryStrategy>,
    ) -> Self {
        Self {
            handle,
            probe,
            strategy,
        }
    }

    /// Ping probe + close-then-reconnect, the usual pairing.
    pub fn with_timeouts(handle: Arc<ResourceHandle>, probe_timeout: Duration, connect_timeout: Duration) -> Self {
        Self::new(
            handle,
            Arc::new(PingProbe::new(probe_timeout)),
            Arc::new(Reconnect::new(connect_timeout, probe_timeout)),
        )
    }

    pub fn name(&self) -> &str {
        self.handle.name()
    }

    pub fn handle(&self) -> &Arc<ResourceHandle> {
        &self.handle
    }

    pub async fn check(&self) -> Liveness {
        self.probe.check(&self.handle).await
    }

    /// Reacquire the binding. Concurrent callers share a single attempt.
    pub async fn recover(&self) -> Result<(), RecoveryError> {
        let handle = &self.handle;
        let strategy = &self.strategy;

        handle
            .recover_with(|| async move {
                tracing::info!(resource = %handle.name(), target = %handle.connector().target(), "Recovering resource");
                let outcome = strategy.recover(handle).await;
                match &outcome {
                    Ok(()) => tracing::info!(resource = %handle.name(), "Connection reestablished"),
                    Err(e) => tracing::error!(resource = %handle.name(), error = %e, "Failed to reconnect"),
                }
                metrics::record_recovery(handle.name(), outcome.is_ok());
                outcome
            })
            .await
    }

    /// Probe, and recover if the probe says so.
    pub async fn ensure_healthy(&self) -> Result<(), RecoveryError> {
        match self.check().await {
            Liveness::Healthy => Ok(()),
            _ => self.recover().await,
        }
    }
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor").field("handle", &self.handle).finish()
    }
}
