//! Liveness endpoints.
//!
//! `/health` probes every registered resource; `/ping` never touches them
//! and only proves the process is serving. Both answer `HEAD` with headers
//! and no body.

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;

use crate::http::server::AppState;
use crate::resource::Liveness;

/// Longest diagnostic reported for a single resource.
const MAX_ERROR_LEN: usize = 100;

pub async fn health_check(State(state): State<AppState>, method: Method) -> Response {
    let timestamp = Utc::now().to_rfc3339();
    let registry = &state.services.registry;

    let mut failures = Vec::new();
    for (supervisor, liveness) in registry.check_all().await {
        if liveness != Liveness::Healthy {
            let reason = supervisor
                .handle()
                .last_error()
                .unwrap_or_else(|| "unreachable".to_string());
            failures.push(truncate(&format!("{}: {}", supervisor.name(), reason)));
        }
    }

    let mut headers = HeaderMap::new();
    if failures.is_empty() {
        let database = if registry.is_empty() { "none" } else { "connected" };
        headers.insert("x-status", HeaderValue::from_static("healthy"));
        headers.insert("x-database", HeaderValue::from_static(database));

        if method == Method::HEAD {
            return (StatusCode::OK, headers).into_response();
        }
        let body = json!({
            "status": "healthy",
            "database": database,
            "timestamp": timestamp,
        });
        return (StatusCode::OK, headers, Json(body)).into_response();
    }

    let error = failures.join("; ");
    tracing::warn!(error = %error, "Health check failed");

    headers.insert("x-status", HeaderValue::from_static("unhealthy"));
    headers.insert("x-error", header_safe(&truncate(&error)));

    if method == Method::HEAD {
        return (StatusCode::SERVICE_UNAVAILABLE, headers).into_response();
    }
    let body = json!({
        "status": "unhealthy",
        "error": error,
        "timestamp": timestamp,
    });
    (StatusCode::SERVICE_UNAVAILABLE, headers, Json(body)).into_response()
}

pub async fn ping(method: Method) -> Response {
    let headers = [("x-status", "pong")];
    if method == Method::HEAD {
        return (StatusCode::OK, headers).into_response();
    }
    (StatusCode::OK, headers, Json(json!({ "status": "pong" }))).into_response()
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_LEN).collect()
}

/// Header values must be visible ASCII.
fn header_safe(text: &str) -> HeaderValue {
    let cleaned: String = text
        .chars()
        .map(|c| if c.is_ascii_graphic() || c == ' ' { c } else { '?' })
        .collect();
    HeaderValue::from_str(&cleaned).unwrap_or_else(|_| HeaderValue::from_static("unavailable"))
}
