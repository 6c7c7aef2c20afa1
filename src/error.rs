//! Error taxonomy shared by the resource, health and resilience subsystems.
//!
//! # Classes
//! - Transient: the far end dropped or refused the binding; recoverable by
//!   reacquiring it.
//! - Fatal: anything else (bad input, missing rows). Never retried.
//!
//! Recovery failures have their own type so callers can tell "the operation
//! failed" apart from "we could not get a connection back".

use std::time::Duration;
use thiserror::Error;

/// Whether an error can be cured by reacquiring the resource binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Fatal,
}

/// Errors that know which side of the retry boundary they fall on.
pub trait Classify {
    fn class(&self) -> ErrorClass;

    fn is_transient(&self) -> bool {
        self.class() == ErrorClass::Transient
    }
}

/// Errors raised while talking to an external resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResourceError {
    /// The binding was closed or reset by the far end.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// A fresh binding could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The round trip did not complete in time.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The resource answered but rejected the operation.
    #[error("operation failed: {0}")]
    Operation(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl Classify for ResourceError {
    fn class(&self) -> ErrorClass {
        match self {
            ResourceError::ConnectionLost(_)
            | ResourceError::Connect(_)
            | ResourceError::Timeout(_) => ErrorClass::Transient,
            ResourceError::Operation(_) | ResourceError::NotFound(_) => ErrorClass::Fatal,
        }
    }
}

/// Reacquiring a binding failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("reconnect failed: {0}")]
    Connect(String),

    #[error("reconnect timed out after {0:?}")]
    Timeout(Duration),

    #[error("fresh connection failed verification: {0}")]
    Verify(String),
}
