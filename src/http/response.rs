//! Response types shared by handlers and the request guard.
//!
//! # Design Decisions
//! - Handlers report resource trouble by attaching a [`ResourceFailure`]
//!   extension; the guard reads it, the client never sees it
//! - Only connection-class failures carry the marker. Everything else
//!   (fatal resource errors, 4xx) passes through the guard as is
//! - The degraded page is fixed text; no error detail leaks to clients

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::error::{Classify, RecoveryError, ResourceError};
use crate::resilience::RunError;

/// Marker extension telling the request guard a handler hit a resource
/// failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFailure {
    /// Worth recovering and replaying the request once.
    pub recoverable: bool,
    /// Resource to recover; `None` means all of them.
    pub resource: Option<String>,
}

/// Errors returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{resource}: {source}")]
    Resource {
        resource: String,
        #[source]
        source: ResourceError,
    },

    #[error("{resource}: {source}")]
    Run {
        resource: String,
        #[source]
        source: RunError<ResourceError>,
    },

    #[error("{resource}: {source}")]
    Recovery {
        resource: String,
        #[source]
        source: RecoveryError,
    },

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("missing or invalid API key")]
    Unauthorized,
}

impl AppError {
    pub fn resource(resource: impl Into<String>, source: ResourceError) -> Self {
        Self::Resource {
            resource: resource.into(),
            source,
        }
    }

    pub fn run(resource: impl Into<String>, source: RunError<ResourceError>) -> Self {
        Self::Run {
            resource: resource.into(),
            source,
        }
    }

    pub fn recovery(resource: impl Into<String>, source: RecoveryError) -> Self {
        Self::Recovery {
            resource: resource.into(),
            source,
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Resource { source, .. } | Self::Run { source: RunError::Operation(source), .. } => {
                match source {
                    ResourceError::NotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                }
            }
            Self::Run { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Recovery { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::UnknownResource(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }

    /// The guard marker for this error, if it is a connection-class failure.
    fn marker(&self) -> Option<ResourceFailure> {
        match self {
            Self::Resource { resource, source }
            | Self::Run {
                resource,
                source: RunError::Operation(source),
            } => source.is_transient().then(|| ResourceFailure {
                recoverable: true,
                resource: Some(resource.clone()),
            }),
            // Already recovered and retried by the runner.
            Self::Run { resource, .. } => Some(ResourceFailure {
                recoverable: false,
                resource: Some(resource.clone()),
            }),
            Self::Recovery { .. } | Self::UnknownResource(_) | Self::Unauthorized => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let marker = self.marker();

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        let mut response = (status, body).into_response();
        if let Some(marker) = marker {
            response.extensions_mut().insert(marker);
        }
        response
    }
}

pub const FALLBACK_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Temporarily unavailable</title>
</head>
<body>
<h1>We'll be right back</h1>
<p>The service is having trouble reaching its data store. Please try again in a moment.</p>
</body>
</html>
"#;

/// Degraded response served when a request cannot be completed.
pub fn fallback_response() -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [
            (header::CONTENT_TYPE, "text/html; charset=utf-8"),
            (header::CACHE_CONTROL, "no-store"),
        ],
        FALLBACK_PAGE,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker_of(error: AppError) -> (StatusCode, Option<ResourceFailure>) {
        let response = error.into_response();
        (response.status(), response.extensions().get::<ResourceFailure>().cloned())
    }

    #[test]
    fn test_transient_error_is_marked_recoverable() {
        let (status, marker) = marker_of(AppError::resource(
            "primary",
            ResourceError::ConnectionLost("reset".into()),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            marker,
            Some(ResourceFailure {
                recoverable: true,
                resource: Some("primary".into())
            })
        );
    }

    #[test]
    fn test_fatal_errors_are_unmarked() {
        let (status, marker) = marker_of(AppError::resource(
            "primary",
            ResourceError::NotFound("order 7".into()),
        ));
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(marker.is_none());

        let (status, marker) = marker_of(AppError::resource(
            "primary",
            ResourceError::Operation("syntax error".into()),
        ));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(marker.is_none());
    }

    #[test]
    fn test_exhausted_runs_are_not_recoverable() {
        let (_, marker) = marker_of(AppError::run(
            "primary",
            RunError::Recovery(RecoveryError::Connect("refused".into())),
        ));
        assert_eq!(marker.map(|m| m.recoverable), Some(false));
    }

    #[test]
    fn test_fallback_is_503_html() {
        let response = fallback_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
    }
}
