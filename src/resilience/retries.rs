//! Retry logic.
//!
//! # Responsibilities
//! - Run an operation, classifying its failures
//! - On transient failure: recover the resource, back off, retry
//! - Stop after `max_attempts` or on the first fatal error
//!
//! # Design Decisions
//! - Fatal errors propagate immediately and never consume retry budget
//! - Every transient failure triggers exactly one recovery, including the last
//! - A failed recovery ends the run; retrying without a binding is pointless
//! - Only retry operations the caller knows to be idempotent. The runner
//!   cannot tell; that is on the call site.

use std::future::Future;
use thiserror::Error;

use crate::config::RetryConfig;
use crate::error::{Classify, ErrorClass, RecoveryError};
use crate::health::Supervisor;
use crate::observability::metrics;
use crate::resilience::backoff::Backoff;

/// How many times to try and how long to wait in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
}

impl RetryPolicy {
    /// `max_attempts` below one is raised to one.
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(config.max_attempts, config.backoff())
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Backoff::None)
    }
}

/// Why a retried operation ultimately failed.
#[derive(Debug, Error)]
pub enum RunError<E>
where
    E: std::error::Error + 'static,
{
    /// Non-recoverable failure, returned on first occurrence.
    #[error(transparent)]
    Operation(E),

    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted { attempts: u32, last: E },

    #[error("recovery failed: {0}")]
    Recovery(#[from] RecoveryError),
}

/// Core retry loop. `recover` is called once per transient failure.
pub async fn run_with_recovery<T, E, Op, OpFut, Rec, RecFut>(
    policy: &RetryPolicy,
    mut operation: Op,
    mut recover: Rec,
) -> Result<T, RunError<E>>
where
    E: Classify + std::error::Error + 'static,
    Op: FnMut() -> OpFut,
    OpFut: Future<Output = Result<T, E>>,
    Rec: FnMut() -> RecFut,
    RecFut: Future<Output = Result<(), RecoveryError>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match operation().await {
            Ok(value) => {
                metrics::record_attempts(attempt, "success");
                return Ok(value);
            }
            Err(e) => e,
        };

        if error.class() == ErrorClass::Fatal {
            tracing::debug!(attempt, error = %error, "Non-recoverable error, not retrying");
            metrics::record_attempts(attempt, "fatal");
            return Err(RunError::Operation(error));
        }

        tracing::warn!(attempt, max_attempts, error = %error, "Transient failure, recovering");
        if let Err(e) = recover().await {
            tracing::error!(attempt, error = %e, "Recovery failed, giving up");
            metrics::record_attempts(attempt, "recovery_failed");
            return Err(RunError::Recovery(e));
        }

        if attempt >= max_attempts {
            tracing::error!(attempts = attempt, error = %error, "Retry budget exhausted");
            metrics::record_attempts(attempt, "exhausted");
            return Err(RunError::Exhausted {
                attempts: attempt,
                last: error,
            });
        }

        let delay = policy.backoff().delay(attempt);
        if !delay.is_zero() {
            tracing::debug!(attempt, delay = ?delay, "Backing off before retry");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Runs operations against one supervised resource.
#[derive(Debug, Clone)]
pub struct RetryingOperationRunner {
    supervisor: Supervisor,
    policy: RetryPolicy,
}

impl RetryingOperationRunner {
    pub fn new(supervisor: Supervisor, policy: RetryPolicy) -> Self {
        Self { supervisor, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn run<T, E, Op, Fut>(&self, operation: Op) -> Result<T, RunError<E>>
    where
        E: Classify + std::error::Error + 'static,
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        run_with_recovery(&self.policy, operation, || self.supervisor.recover()).await
    }
}
