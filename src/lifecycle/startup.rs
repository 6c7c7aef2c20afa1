//! Startup orchestration.
//!
//! Builds the registry from config, wires both schedulers to it and hands
//! the result to the HTTP layer and the shutdown path.

use std::sync::Arc;
use thiserror::Error;

use crate::config::{PlatformEnv, WardenConfig};
use crate::health::Supervisor;
use crate::resilience::{RetryPolicy, RetryingOperationRunner};
use crate::resource::{ResourceHandle, ResourceRegistry, TcpConnector};
use crate::scheduler::{ExternalPingScheduler, KeepAliveScheduler, SchedulerStatus, SelfPing};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("duplicate resource name: {0}")]
    DuplicateResource(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Everything the process owns, built once.
pub struct Services {
    pub config: WardenConfig,
    pub platform: PlatformEnv,
    pub registry: Arc<ResourceRegistry>,
    pub policy: RetryPolicy,
    pub keep_alive: KeepAliveScheduler,
    pub self_ping: ExternalPingScheduler,
}

impl Services {
    /// Register a TCP-backed supervisor for every configured resource.
    pub fn bootstrap(config: WardenConfig, platform: PlatformEnv) -> Result<Self, StartupError> {
        let registry = Arc::new(ResourceRegistry::new());

        for resource in &config.resources {
            let connector = Arc::new(TcpConnector::new(resource.address.clone()));
            let handle = Arc::new(ResourceHandle::new(resource.name.clone(), connector));
            let supervisor = Supervisor::with_timeouts(
                handle,
                resource.probe_timeout(),
                resource.connect_timeout(),
            );
            if !registry.register(supervisor) {
                return Err(StartupError::DuplicateResource(resource.name.clone()));
            }
        }

        Self::from_parts(config, registry, platform)
    }

    /// Build around an already populated registry.
    pub fn from_parts(
        config: WardenConfig,
        registry: Arc<ResourceRegistry>,
        platform: PlatformEnv,
    ) -> Result<Self, StartupError> {
        let policy = RetryPolicy::from_config(&config.retry);

        let keep_alive = KeepAliveScheduler::keep_alive(
            registry.clone(),
            config.keep_alive.scheduler(platform.active),
        );

        let self_ping = ExternalPingScheduler::self_ping(
            SelfPing::new(
                platform.external_url.clone(),
                &config.self_ping.path,
                config.self_ping.request_timeout(),
            )?,
            config.self_ping.scheduler(platform.active),
        );

        Ok(Self {
            config,
            platform,
            registry,
            policy,
            keep_alive,
            self_ping,
        })
    }

    /// Establish the first binding of every resource.
    ///
    /// Returns the names that could not be connected. They stay registered
    /// and are recovered on first use.
    pub async fn connect_all(&self) -> Vec<String> {
        let mut failed = Vec::new();
        for supervisor in self.registry.all() {
            match supervisor.recover().await {
                Ok(()) => tracing::info!(resource = %supervisor.name(), "Resource connected"),
                Err(e) => {
                    tracing::warn!(
                        resource = %supervisor.name(),
                        error = %e,
                        "Resource unavailable at startup"
                    );
                    failed.push(supervisor.name().to_string());
                }
            }
        }
        failed
    }

    /// Start both schedulers. Each decides for itself whether it may run.
    pub fn start_background(&self) {
        if !self.platform.active {
            tracing::info!(
                variable = %self.config.platform.activation_env,
                "Platform not detected, running in local mode"
            );
        }
        self.keep_alive.start();
        self.self_ping.start();
    }

    /// Runner bound to one resource, using the configured retry policy.
    pub fn runner(&self, resource: &str) -> Option<RetryingOperationRunner> {
        self.registry
            .get(resource)
            .map(|supervisor| RetryingOperationRunner::new(supervisor, self.policy.clone()))
    }

    pub fn scheduler_statuses(&self) -> Vec<SchedulerStatus> {
        vec![self.keep_alive.status(), self.self_ping.status()]
    }

    /// Stop both schedulers, each bounded by its join timeout.
    pub async fn shutdown(&self) {
        let (keep_alive, self_ping) = tokio::join!(self.keep_alive.stop(), self.self_ping.stop());
        if !(keep_alive && self_ping) {
            tracing::warn!("A scheduler had to be aborted during shutdown");
        }
    }
}
