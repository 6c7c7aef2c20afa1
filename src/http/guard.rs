//! Per-request resource guard.
//!
//! # States
//! ```text
//! Buffer body (413 over the limit, nothing probed)
//!     → PreCheck (probe all, recover unhealthy; best effort)
//!     → Dispatch
//!         → no marker                   → response as is
//!         → recoverable marker          → recover → Dispatch once more
//!         → unrecoverable / second fail → fallback page (503)
//! ```
//!
//! The request body is buffered up to `max_body_bytes` so the request can
//! be replayed. Inner service errors also end in the fallback page; the
//! guard itself never fails.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use std::convert::Infallible;
use std::fmt::Display;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service, ServiceExt};

use crate::error::RecoveryError;
use crate::http::response::{fallback_response, ResourceFailure};
use crate::observability::metrics;
use crate::resource::ResourceRegistry;

#[derive(Clone)]
pub struct RequestGuardLayer {
    registry: Arc<ResourceRegistry>,
    max_body_bytes: usize,
}

impl RequestGuardLayer {
    pub fn new(registry: Arc<ResourceRegistry>, max_body_bytes: usize) -> Self {
        Self {
            registry,
            max_body_bytes,
        }
    }
}

impl<S> Layer<S> for RequestGuardLayer {
    type Service = RequestGuard<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestGuard {
            inner,
            registry: self.registry.clone(),
            max_body_bytes: self.max_body_bytes,
        }
    }
}

#[derive(Clone)]
pub struct RequestGuard<S> {
    inner: S,
    registry: Arc<ResourceRegistry>,
    max_body_bytes: usize,
}

impl<S> Service<Request> for RequestGuard<S>
where
    S: Service<Request, Response = Response> + Clone + Send + 'static,
    S::Error: Display + Send,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner service is awaited per dispatch.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let inner = self.inner.clone();
        let registry = self.registry.clone();
        let limit = self.max_body_bytes;

        Box::pin(async move { Ok(guard(inner, registry, limit, request).await) })
    }
}

async fn guard<S>(inner: S, registry: Arc<ResourceRegistry>, limit: usize, request: Request) -> Response
where
    S: Service<Request, Response = Response> + Clone,
    S::Error: Display,
{
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, limit, "Could not buffer request body");
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        }
    };

    precheck(&registry).await;

    let first = match dispatch(inner.clone(), &parts, &body).await {
        Some(response) => response,
        None => return fallback(),
    };

    let Some(failure) = first.extensions().get::<ResourceFailure>().cloned() else {
        return first;
    };

    if !failure.recoverable {
        tracing::warn!(resource = ?failure.resource, "Unrecoverable resource failure");
        return fallback();
    }

    tracing::warn!(
        resource = ?failure.resource,
        method = %parts.method,
        uri = %parts.uri,
        "Resource failure during request, recovering and retrying"
    );
    if let Err(e) = recover(&registry, failure.resource.as_deref()).await {
        tracing::error!(error = %e, "Recovery failed, serving fallback");
        return fallback();
    }

    match dispatch(inner, &parts, &body).await {
        Some(response) if response.extensions().get::<ResourceFailure>().is_none() => response,
        Some(_) => {
            tracing::error!(uri = %parts.uri, "Retry after recovery failed, serving fallback");
            fallback()
        }
        None => fallback(),
    }
}

async fn precheck(registry: &ResourceRegistry) {
    for (resource, error) in registry.recover_unhealthy().await {
        tracing::warn!(resource = %resource, error = %error, "Pre-request recovery failed");
    }
}

async fn recover(registry: &ResourceRegistry, resource: Option<&str>) -> Result<(), RecoveryError> {
    match resource.and_then(|name| registry.get(name)) {
        Some(supervisor) => supervisor.recover().await,
        None => registry.recover_all().await,
    }
}

/// Forward one copy of the request. `None` if the inner service failed.
async fn dispatch<S>(inner: S, parts: &Parts, body: &Bytes) -> Option<Response>
where
    S: Service<Request, Response = Response>,
    S::Error: Display,
{
    match inner.oneshot(rebuild(parts, body)).await {
        Ok(response) => Some(response),
        Err(e) => {
            tracing::error!(error = %e, uri = %parts.uri, "Inner service error");
            None
        }
    }
}

fn rebuild(parts: &Parts, body: &Bytes) -> Request {
    let mut request = Request::new(Body::from(body.clone()));
    *request.method_mut() = parts.method.clone();
    *request.uri_mut() = parts.uri.clone();
    *request.version_mut() = parts.version;
    *request.headers_mut() = parts.headers.clone();
    *request.extensions_mut() = parts.extensions.clone();
    request
}

fn fallback() -> Response {
    metrics::record_guard_fallback();
    fallback_response()
}
