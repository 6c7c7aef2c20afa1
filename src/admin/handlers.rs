use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;

use crate::http::response::AppError;
use crate::http::server::AppState;
use crate::resilience::RetryingOperationRunner;
use crate::resource::{Liveness, ResourceSnapshot};
use crate::scheduler::SchedulerStatus;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub platform_active: bool,
    pub resources: usize,
    pub healthy_resources: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    let snapshots = state.services.registry.snapshots();
    let healthy = snapshots
        .iter()
        .filter(|s| s.liveness == Liveness::Healthy)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if healthy == snapshots.len() { "operational" } else { "degraded" },
        platform_active: state.services.platform.active,
        resources: snapshots.len(),
        healthy_resources: healthy,
    })
}

pub async fn get_resources(State(state): State<AppState>) -> Json<Vec<ResourceSnapshot>> {
    Json(state.services.registry.snapshots())
}

/// Ping one resource through the retrying runner.
pub async fn ping_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceSnapshot>, AppError> {
    let supervisor = state
        .services
        .registry
        .get(&name)
        .ok_or_else(|| AppError::UnknownResource(name.clone()))?;

    let handle = supervisor.handle().clone();
    let runner = RetryingOperationRunner::new(supervisor, state.services.policy.clone());
    runner
        .run(|| {
            let handle = handle.clone();
            async move { handle.ping().await }
        })
        .await
        .map_err(|e| AppError::run(name.as_str(), e))?;

    handle.record(Liveness::Healthy, None);
    Ok(Json(handle.snapshot()))
}

/// Force a close-and-reconnect of one resource.
pub async fn recover_resource(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResourceSnapshot>, AppError> {
    let supervisor = state
        .services
        .registry
        .get(&name)
        .ok_or_else(|| AppError::UnknownResource(name.clone()))?;

    tracing::info!(resource = %name, "Manual recovery requested");
    supervisor
        .recover()
        .await
        .map_err(|e| AppError::recovery(name.as_str(), e))?;

    Ok(Json(supervisor.handle().snapshot()))
}

pub async fn get_schedulers(State(state): State<AppState>) -> Json<Vec<SchedulerStatus>> {
    Json(state.services.scheduler_statuses())
}
