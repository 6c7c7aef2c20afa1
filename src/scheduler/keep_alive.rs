//! Keep-alive payload.
//!
//! Every tick probes each registered resource and recovers the ones that
//! fail, so idle bindings are exercised before the far end drops them.

use async_trait::async_trait;
use std::sync::Arc;

use crate::resource::ResourceRegistry;
use crate::scheduler::periodic::{Payload, PeriodicTask, SchedulerConfig};
use crate::scheduler::TickError;

pub struct KeepAlive {
    registry: Arc<ResourceRegistry>,
}

impl KeepAlive {
    pub fn new(registry: Arc<ResourceRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Payload for KeepAlive {
    fn name(&self) -> &'static str {
        "keep-alive"
    }

    async fn tick(&self) -> Result<(), TickError> {
        let failures = self.registry.recover_unhealthy().await;
        if failures.is_empty() {
            return Ok(());
        }

        for (resource, error) in &failures {
            tracing::warn!(resource = %resource, error = %error, "Keep-alive could not recover resource");
        }
        Err(TickError::Unrecovered(
            failures.into_iter().map(|(name, _)| name).collect(),
        ))
    }
}

pub type KeepAliveScheduler = PeriodicTask<KeepAlive>;

impl PeriodicTask<KeepAlive> {
    pub fn keep_alive(registry: Arc<ResourceRegistry>, config: SchedulerConfig) -> Self {
        PeriodicTask::new(KeepAlive::new(registry), config)
    }
}
