//! Liveness probing.
//!
//! # Responsibilities
//! - Issue one minimal round trip against a resource
//! - Bound it with a timeout
//! - Record the observed liveness on the handle
//!
//! # Design Decisions
//! - A probe never reconnects; that is the recovery strategy's job
//! - Probe failures are data, not errors: the caller always gets a `Liveness`

use async_trait::async_trait;
use std::time::Duration;

use crate::observability::metrics;
use crate::resilience::timeouts::with_deadline;
use crate::resource::{Liveness, ResourceHandle};

#[async_trait]
pub trait HealthProbe: Send + Sync {
    async fn check(&self, handle: &ResourceHandle) -> Liveness;
}

/// Pings the current binding.
#[derive(Debug, Clone)]
pub struct PingProbe {
    timeout: Duration,
}

impl PingProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl HealthProbe for PingProbe {
    async fn check(&self, handle: &ResourceHandle) -> Liveness {
        let (liveness, error) = match with_deadline(self.timeout, handle.ping()).await {
            Ok(()) => (Liveness::Healthy, None),
            Err(e) => {
                tracing::debug!(resource = %handle.name(), error = %e, "Probe failed");
                (Liveness::Unhealthy, Some(e.to_string()))
            }
        };

        handle.record(liveness, error);
        metrics::record_probe(handle.name(), liveness == Liveness::Healthy);
        liveness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::ScriptedConnector;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_unbound_handle_is_unhealthy() {
        let handle = ResourceHandle::new("db", Arc::new(ScriptedConnector::default()));
        let probe = PingProbe::new(Duration::from_millis(100));

        assert_eq!(probe.check(&handle).await, Liveness::Unhealthy);
        assert_eq!(handle.liveness(), Liveness::Unhealthy);
        assert!(handle.last_error().unwrap().contains("no connection bound"));
    }

    #[tokio::test]
    async fn test_probe_does_not_reconnect() {
        let connector = Arc::new(ScriptedConnector::default());
        let handle = ResourceHandle::new("db", connector.clone());
        let probe = PingProbe::new(Duration::from_millis(100));

        probe.check(&handle).await;
        probe.check(&handle).await;
        assert_eq!(connector.connects.load(Ordering::SeqCst), 0);
    }
}
