//! Self-ping payload.
//!
//! Calls our own `/ping` through the public address so the hosting
//! platform sees traffic and does not idle the process. Without a
//! configured address the scheduler declines to start.

use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use crate::scheduler::periodic::{Payload, PeriodicTask, SchedulerConfig};
use crate::scheduler::TickError;

pub struct SelfPing {
    client: reqwest::Client,
    target: Option<Url>,
}

impl SelfPing {
    /// `base` is the externally reachable address; `path` is appended to it.
    pub fn new(base: Option<Url>, path: &str, request_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("conn-warden-self-ping/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let target = base.and_then(|base| {
            let joined = format!("{}{}", base.as_str().trim_end_matches('/'), path);
            Url::parse(&joined).ok()
        });

        Ok(Self { client, target })
    }

    pub fn target(&self) -> Option<&Url> {
        self.target.as_ref()
    }
}

#[async_trait]
impl Payload for SelfPing {
    fn name(&self) -> &'static str {
        "self-ping"
    }

    fn preflight(&self) -> Result<(), String> {
        match self.target {
            Some(_) => Ok(()),
            None => Err("no external URL configured, skipping self-ping".to_string()),
        }
    }

    async fn tick(&self) -> Result<(), TickError> {
        let Some(target) = &self.target else {
            return Ok(());
        };

        let response = self.client.get(target.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TickError::Status(status));
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => tracing::debug!(
                target = %target,
                status = %body.get("status").and_then(|s| s.as_str()).unwrap_or("?"),
                "Self-ping successful"
            ),
            Err(e) => tracing::debug!(
                target = %target,
                http_status = %status,
                error = %e,
                "Self-ping successful, response body not JSON"
            ),
        }
        Ok(())
    }
}

pub type ExternalPingScheduler = PeriodicTask<SelfPing>;

impl PeriodicTask<SelfPing> {
    pub fn self_ping(payload: SelfPing, config: SchedulerConfig) -> Self {
        PeriodicTask::new(payload, config)
    }
}
