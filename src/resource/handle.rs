//! Resource handle abstraction.
//!
//! # Responsibilities
//! - Represent a single named external resource
//! - Own the current binding (recreated in place on failure)
//! - Track liveness state and when it was last observed
//! - Serialize recovery so concurrent callers share one reconnect

use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{RecoveryError, ResourceError};
use crate::resource::connector::{Connection, Connector};

/// Liveness enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Liveness {
    Unknown = 0,
    Healthy = 1,
    Unhealthy = 2,
}

impl From<u8> for Liveness {
    fn from(val: u8) -> Self {
        match val {
            1 => Liveness::Healthy,
            2 => Liveness::Unhealthy,
            _ => Liveness::Unknown,
        }
    }
}

impl Liveness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Liveness::Unknown => "unknown",
            Liveness::Healthy => "healthy",
            Liveness::Unhealthy => "unhealthy",
        }
    }
}

/// Point-in-time view of a handle for the admin API.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSnapshot {
    pub name: String,
    pub target: String,
    pub liveness: Liveness,
    pub last_checked: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub recoveries: u64,
}

/// A single named resource.
pub struct ResourceHandle {
    name: String,
    connector: Arc<dyn Connector>,

    /// Current liveness (0=Unknown, 1=Healthy, 2=Unhealthy).
    liveness: AtomicU8,
    last_checked: ArcSwapOption<DateTime<Utc>>,
    last_error: ArcSwapOption<String>,

    binding: Mutex<Option<Box<dyn Connection>>>,

    /// Held for the duration of a recovery; stores the last outcome so that
    /// callers who queued behind it can return it without reconnecting.
    recovery_gate: Mutex<Option<Result<(), RecoveryError>>>,
    /// Bumped each time a recovery completes.
    generation: AtomicU64,
}

impl ResourceHandle {
    /// Create an unbound handle. Nothing is connected until the first recovery.
    pub fn new(name: impl Into<String>, connector: Arc<dyn Connector>) -> Self {
        Self {
            name: name.into(),
            connector,
            liveness: AtomicU8::new(Liveness::Unknown as u8),
            last_checked: ArcSwapOption::empty(),
            last_error: ArcSwapOption::empty(),
            binding: Mutex::new(None),
            recovery_gate: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connector(&self) -> &Arc<dyn Connector> {
        &self.connector
    }

    pub fn liveness(&self) -> Liveness {
        Liveness::from(self.liveness.load(Ordering::Acquire))
    }

    pub fn last_checked(&self) -> Option<DateTime<Utc>> {
        self.last_checked.load_full().map(|ts| *ts)
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error.load_full().map(|e| e.as_ref().clone())
    }

    /// Number of recoveries that actually ran (shared results are not counted).
    pub fn recoveries(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Record the outcome of a liveness observation.
    pub fn record(&self, liveness: Liveness, error: Option<String>) {
        let previous = Liveness::from(self.liveness.swap(liveness as u8, Ordering::AcqRel));
        self.last_checked.store(Some(Arc::new(Utc::now())));
        self.last_error.store(error.map(Arc::new));

        if previous != liveness {
            match liveness {
                Liveness::Healthy => tracing::info!(resource = %self.name, "Resource is now healthy"),
                Liveness::Unhealthy => tracing::warn!(resource = %self.name, "Resource is now unhealthy"),
                Liveness::Unknown => {}
            }
        }
    }

    /// Lock the binding slot.
    pub async fn binding(&self) -> MutexGuard<'_, Option<Box<dyn Connection>>> {
        self.binding.lock().await
    }

    /// Round trip over the current binding without touching liveness state.
    pub async fn ping(&self) -> Result<(), ResourceError> {
        let mut binding = self.binding.lock().await;
        match binding.as_mut() {
            Some(conn) => conn.ping().await,
            None => Err(ResourceError::ConnectionLost("no connection bound".to_string())),
        }
    }

    /// Run `recover` with single-flight semantics.
    ///
    /// Only one recovery runs at a time. A caller that had to wait for a
    /// recovery started by someone else returns that recovery's outcome.
    pub async fn recover_with<F, Fut>(&self, recover: F) -> Result<(), RecoveryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<(), RecoveryError>>,
    {
        let observed = self.generation.load(Ordering::Acquire);
        let mut gate = self.recovery_gate.lock().await;

        if self.generation.load(Ordering::Acquire) != observed {
            if let Some(outcome) = gate.as_ref() {
                tracing::debug!(resource = %self.name, "Joined in-flight recovery");
                return outcome.clone();
            }
        }

        let outcome = recover().await;
        *gate = Some(outcome.clone());
        self.generation.fetch_add(1, Ordering::AcqRel);
        outcome
    }

    pub fn snapshot(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            name: self.name.clone(),
            target: self.connector.target(),
            liveness: self.liveness(),
            last_checked: self.last_checked(),
            last_error: self.last_error(),
            recoveries: self.recoveries(),
        }
    }
}

impl std::fmt::Debug for ResourceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceHandle")
            .field("name", &self.name)
            .field("target", &self.connector.target())
            .field("liveness", &self.liveness())
            .finish()
    }
}
