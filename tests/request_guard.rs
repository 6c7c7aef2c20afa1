//! Request guard: pre-check, single retry after recovery, degraded fallback.

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

use conn_warden::error::RecoveryError;
use conn_warden::http::{AppError, RequestGuardLayer, FALLBACK_PAGE};
use conn_warden::resilience::RunError;
use conn_warden::resource::ResourceRegistry;
use conn_warden::ResourceError;

mod common;

#[derive(Clone)]
struct TestState {
    registry: Arc<ResourceRegistry>,
    calls: Arc<AtomicU32>,
}

impl TestState {
    fn call(&self) -> u32 {
        self.calls.fetch_add(1, Ordering::SeqCst)
    }
}

fn lost() -> AppError {
    AppError::resource("primary", ResourceError::ConnectionLost("reset by peer".into()))
}

/// Fails with a connection error on the first call only.
async fn flaky(State(state): State<TestState>) -> Result<&'static str, AppError> {
    if state.call() == 0 {
        return Err(lost());
    }
    Ok("rows")
}

async fn always_lost(State(state): State<TestState>) -> Result<&'static str, AppError> {
    state.call();
    Err(lost())
}

async fn not_found(State(state): State<TestState>) -> Result<&'static str, AppError> {
    state.call();
    Err(AppError::resource("primary", ResourceError::NotFound("order 42".into())))
}

async fn exhausted(State(state): State<TestState>) -> Result<&'static str, AppError> {
    state.call();
    Err(AppError::run(
        "primary",
        RunError::Recovery(RecoveryError::Connect("refused".into())),
    ))
}

async fn plain_error(State(state): State<TestState>) -> (StatusCode, &'static str) {
    state.call();
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

/// Reads from the resource binding directly.
async fn query(State(state): State<TestState>) -> Result<&'static str, AppError> {
    state.call();
    let supervisor = state.registry.get("primary").unwrap();
    supervisor
        .handle()
        .ping()
        .await
        .map_err(|e| AppError::resource("primary", e))?;
    Ok("rows")
}

async fn echo(State(state): State<TestState>, body: Bytes) -> Result<Bytes, AppError> {
    if state.call() == 0 {
        return Err(lost());
    }
    Ok(body)
}

fn guarded(registry: Arc<ResourceRegistry>) -> (Router, Arc<AtomicU32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let state = TestState {
        registry: registry.clone(),
        calls: calls.clone(),
    };

    let router = Router::new()
        .route("/flaky", get(flaky))
        .route("/always-lost", get(always_lost))
        .route("/not-found", get(not_found))
        .route("/exhausted", get(exhausted))
        .route("/plain-error", get(plain_error))
        .route("/query", get(query))
        .route("/echo", post(echo))
        .with_state(state)
        .layer(RequestGuardLayer::new(registry, 1024));

    (router, calls)
}

async fn connected() -> (Arc<ResourceRegistry>, Arc<common::ScriptedConnector>) {
    let (registry, mut connectors) = common::registry_with(&["primary"]);
    registry.recover_all().await.unwrap();
    (registry, connectors.remove(0))
}

fn get_req(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_recoverable_failure_is_retried_once() {
    let (registry, connector) = connected().await;
    let (router, calls) = guarded(registry);

    let response = router.oneshot(get_req("/flaky")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "rows");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(connector.connects(), 2);
}

#[tokio::test]
async fn test_second_failure_serves_fallback() {
    let (registry, _connector) = connected().await;
    let (router, calls) = guarded(registry);

    let response = router.oneshot(get_req("/always-lost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(text(response).await, FALLBACK_PAGE);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unmarked_errors_pass_through() {
    let (registry, connector) = connected().await;
    let (router, calls) = guarded(registry);

    let response = router.clone().oneshot(get_req("/not-found")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(text(response).await.contains("order 42"));

    let response = router.oneshot(get_req("/plain-error")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(text(response).await, "boom");

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(connector.connects(), 1);
}

#[tokio::test]
async fn test_unrecoverable_marker_serves_fallback_without_retry() {
    let (registry, connector) = connected().await;
    let (router, calls) = guarded(registry);

    let response = router.oneshot(get_req("/exhausted")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(connector.connects(), 1);
}

#[tokio::test]
async fn test_failed_recovery_serves_fallback() {
    let (registry, connector) = connected().await;
    connector.go_down();
    let (router, calls) = guarded(registry);

    let response = router.oneshot(get_req("/flaky")).await.unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(text(response).await, FALLBACK_PAGE);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_precheck_recovers_before_dispatch() {
    let (registry, connector) = connected().await;
    connector.drop_connections();
    let (router, calls) = guarded(registry.clone());

    let response = router.oneshot(get_req("/query")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(connector.connects(), 2);
    assert_eq!(
        registry.get("primary").unwrap().handle().liveness(),
        conn_warden::resource::Liveness::Healthy
    );
}

#[tokio::test]
async fn test_retry_replays_request_body() {
    let (registry, _connector) = connected().await;
    let (router, calls) = guarded(registry);

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from("order=7&qty=2"))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(text(response).await, "order=7&qty=2");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_oversized_body_is_rejected_before_precheck() {
    let (registry, connector) = connected().await;
    connector.drop_connections();
    let (router, calls) = guarded(registry);

    let request = Request::builder()
        .method("POST")
        .uri("/echo")
        .body(Body::from(vec![b'x'; 4096]))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(connector.connects(), 1);
}
