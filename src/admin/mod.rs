//! Operational API, mounted under `/admin` when an API key is configured.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::guard::RequestGuardLayer;
use crate::http::server::AppState;

/// Admin routes. The request guard, when enabled, sits inside the auth
/// check so rejected callers never reach the pre-check.
pub fn setup_admin_router(state: AppState) -> Router<AppState> {
    let guard = &state.services.config.guard;

    let mut router = Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/resources", get(get_resources))
        .route("/admin/resources/{name}/ping", post(ping_resource))
        .route("/admin/resources/{name}/recover", post(recover_resource))
        .route("/admin/schedulers", get(get_schedulers));

    if guard.enabled {
        router = router.route_layer(RequestGuardLayer::new(
            state.services.registry.clone(),
            guard.max_body_bytes,
        ));
    }

    router.route_layer(middleware::from_fn_with_state(state, admin_auth_middleware))
}
