//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the Axum router (liveness endpoints, admin API)
//! - Keep `/health` and `/ping` outside the request guard
//! - Wire up middleware (timeout, request ID, tracing)
//! - Serve until the shutdown token fires

use axum::{
    body::Body,
    http::Request,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin::setup_admin_router;
use crate::http::health::{health_check, ping};
use crate::lifecycle::Services;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
}

/// HTTP front of the service.
pub struct WardenServer {
    router: Router,
}

impl WardenServer {
    pub fn new(services: Arc<Services>) -> Self {
        let router = build_router(AppState { services });
        Self { router }
    }

    /// The fully layered router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve on `listener` until `shutdown` is cancelled, then drain.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(state: AppState) -> Router {
    let config = &state.services.config;
    let request_timeout = Duration::from_secs(config.listener.request_timeout_secs);

    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/health/", get(health_check))
        .route("/ping", get(ping))
        .route("/ping/", get(ping));

    if config.admin.api_key.is_empty() {
        tracing::info!("Admin API disabled (no api_key configured)");
    } else {
        router = router.merge(setup_admin_router(state.clone()));
    }

    router
        .with_state(state.clone())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown");
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = %request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
