//! Named resource registry.
//!
//! One supervisor per resource name. Iteration order is by name so that
//! logs and health reports are stable.

use dashmap::DashMap;

use crate::error::RecoveryError;
use crate::health::Supervisor;
use crate::resource::handle::{Liveness, ResourceSnapshot};

#[derive(Default)]
pub struct ResourceRegistry {
    supervisors: DashMap<String, Supervisor>,
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a supervisor. Returns false if the name is already taken.
    pub fn register(&self, supervisor: Supervisor) -> bool {
        let name = supervisor.name().to_string();
        match self.supervisors.entry(name) {
            dashmap::mapref::entry::Entry::Occupied(entry) => {
                tracing::warn!(resource = %entry.key(), "Resource already registered");
                false
            }
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                tracing::debug!(resource = %entry.key(), "Resource registered");
                entry.insert(supervisor);
                true
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Supervisor> {
        self.supervisors.get(name).map(|s| s.value().clone())
    }

    /// All supervisors, sorted by name.
    pub fn all(&self) -> Vec<Supervisor> {
        let mut all: Vec<Supervisor> = self.supervisors.iter().map(|s| s.value().clone()).collect();
        all.sort_by(|a, b| a.name().cmp(b.name()));
        all
    }

    pub fn len(&self) -> usize {
        self.supervisors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.supervisors.is_empty()
    }

    /// Probe every resource.
    pub async fn check_all(&self) -> Vec<(Supervisor, Liveness)> {
        let mut reports = Vec::with_capacity(self.len());
        for supervisor in self.all() {
            let liveness = supervisor.check().await;
            reports.push((supervisor, liveness));
        }
        reports
    }

    /// Probe every resource and recover the unhealthy ones.
    ///
    /// Returns the resources that could not be recovered.
    pub async fn recover_unhealthy(&self) -> Vec<(String, RecoveryError)> {
        let mut failures = Vec::new();
        for (supervisor, liveness) in self.check_all().await {
            if liveness == Liveness::Healthy {
                continue;
            }
            if let Err(e) = supervisor.recover().await {
                failures.push((supervisor.name().to_string(), e));
            }
        }
        failures
    }

    /// Recover every resource regardless of its last observed state.
    pub async fn recover_all(&self) -> Result<(), RecoveryError> {
        let mut first_error = None;
        for supervisor in self.all() {
            if let Err(e) = supervisor.recover().await {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn snapshots(&self) -> Vec<ResourceSnapshot> {
        self.all().iter().map(|s| s.handle().snapshot()).collect()
    }
}
