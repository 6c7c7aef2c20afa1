//! Generic periodic background task.
//!
//! # States
//! ```text
//! Idle → Running → (tick → sleep)* → Stopped
//! ```
//!
//! # Design Decisions
//! - `start()` is idempotent; a second call while running is a no-op
//! - The interval sleep is cut into poll quanta, each raced against the
//!   cancellation token, so `stop()` never waits out a full interval
//! - A tick is also raced against cancellation; a slow outbound call
//!   cannot hold up shutdown
//! - Errors and panics inside a tick are logged at the tick boundary and
//!   never end the loop
//! - `stop()` joins with a bounded timeout, then aborts

use async_trait::async_trait;
use futures_util::FutureExt;
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::observability::metrics;
use crate::scheduler::TickError;

/// Work performed on every tick.
#[async_trait]
pub trait Payload: Send + Sync + 'static {
    /// Task name for logs and metrics.
    fn name(&self) -> &'static str;

    /// Checked once by `start()`. An error means there is nothing to do and
    /// the task does not start.
    fn preflight(&self) -> Result<(), String> {
        Ok(())
    }

    async fn tick(&self) -> Result<(), TickError>;
}

/// Scheduling parameters. Read once when the task starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub interval: Duration,
    pub poll_quantum: Duration,
    pub join_timeout: Duration,
    /// Result of the activation predicate.
    pub enabled: bool,
}

impl SchedulerConfig {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            poll_quantum: Duration::from_secs(10),
            join_timeout: Duration::from_secs(5),
            enabled: true,
        }
    }

    pub fn poll_quantum(mut self, quantum: Duration) -> Self {
        self.poll_quantum = quantum;
        self
    }

    pub fn join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

/// Admin view of a scheduler.
#[derive(Debug, Clone, Serialize)]
pub struct SchedulerStatus {
    pub name: &'static str,
    pub state: SchedulerState,
    pub enabled: bool,
    pub interval_secs: u64,
    pub ticks: u64,
}

struct Running {
    token: CancellationToken,
    join: JoinHandle<()>,
}

pub struct PeriodicTask<P: Payload> {
    payload: Arc<P>,
    config: SchedulerConfig,
    running: Mutex<Option<Running>>,
    stopped: AtomicBool,
    ticks: Arc<AtomicU64>,
}

impl<P: Payload> PeriodicTask<P> {
    pub fn new(payload: P, config: SchedulerConfig) -> Self {
        Self {
            payload: Arc::new(payload),
            config,
            running: Mutex::new(None),
            stopped: AtomicBool::new(false),
            ticks: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.payload.name()
    }

    pub fn payload(&self) -> &P {
        &self.payload
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Completed ticks since construction.
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        let slot = self.running.lock().expect("scheduler mutex poisoned");
        slot.as_ref().is_some_and(|r| !r.join.is_finished())
    }

    pub fn state(&self) -> SchedulerState {
        if self.is_running() {
            SchedulerState::Running
        } else if self.stopped.load(Ordering::Acquire) {
            SchedulerState::Stopped
        } else {
            SchedulerState::Idle
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            name: self.name(),
            state: self.state(),
            enabled: self.config.enabled,
            interval_secs: self.config.interval.as_secs(),
            ticks: self.ticks(),
        }
    }

    /// Spawn the background loop. Returns true only if this call started it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut slot = self.running.lock().expect("scheduler mutex poisoned");
        let task = self.name();

        if slot.as_ref().is_some_and(|r| !r.join.is_finished()) {
            tracing::debug!(task, "Scheduler already running");
            return false;
        }

        if !self.config.enabled {
            tracing::info!(task, "Scheduler disabled in this environment");
            return false;
        }

        if let Err(reason) = self.payload.preflight() {
            tracing::warn!(task, reason = %reason, "Scheduler not starting");
            return false;
        }

        let token = CancellationToken::new();
        let join = tokio::spawn(run_loop(
            self.payload.clone(),
            self.config.clone(),
            token.clone(),
            self.ticks.clone(),
        ));

        *slot = Some(Running { token, join });
        self.stopped.store(false, Ordering::Release);
        tracing::info!(
            task,
            interval_secs = self.config.interval.as_secs(),
            "Scheduler started"
        );
        true
    }

    /// Cancel the loop and wait for it, at most `join_timeout`.
    ///
    /// Returns false if the task had to be aborted.
    pub async fn stop(&self) -> bool {
        let running = self.running.lock().expect("scheduler mutex poisoned").take();
        let task = self.name();

        let Some(Running { token, mut join }) = running else {
            return true;
        };

        token.cancel();
        let clean = match time::timeout(self.config.join_timeout, &mut join).await {
            Ok(_) => true,
            Err(_) => {
                tracing::warn!(
                    task,
                    timeout = ?self.config.join_timeout,
                    "Scheduler did not stop in time, aborting"
                );
                join.abort();
                false
            }
        };

        self.stopped.store(true, Ordering::Release);
        tracing::info!(task, "Scheduler stopped");
        clean
    }
}

impl<P: Payload> Drop for PeriodicTask<P> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.running.lock() {
            if let Some(running) = slot.take() {
                running.token.cancel();
            }
        }
    }
}

async fn run_loop<P: Payload>(
    payload: Arc<P>,
    config: SchedulerConfig,
    token: CancellationToken,
    ticks: Arc<AtomicU64>,
) {
    let task = payload.name();

    loop {
        let tick = AssertUnwindSafe(payload.tick()).catch_unwind();

        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            outcome = tick => {
                ticks.fetch_add(1, Ordering::AcqRel);
                match outcome {
                    Ok(Ok(())) => {
                        tracing::debug!(task, "Tick completed");
                        metrics::record_tick(task, "ok");
                    }
                    Ok(Err(e)) => {
                        tracing::error!(task, error = %e, "Tick failed");
                        metrics::record_tick(task, "error");
                    }
                    Err(_) => {
                        tracing::error!(task, "Tick panicked");
                        metrics::record_tick(task, "panic");
                    }
                }
            }
        }

        if !sleep_interval(&token, config.interval, config.poll_quantum).await {
            break;
        }
    }

    tracing::debug!(task, "Scheduler loop exited");
}

/// Sleep for `interval` in slices of at most `quantum`.
///
/// Returns false as soon as cancellation is observed.
async fn sleep_interval(token: &CancellationToken, interval: Duration, quantum: Duration) -> bool {
    let quantum = if quantum.is_zero() { interval } else { quantum };
    let mut remaining = interval;

    while !remaining.is_zero() {
        if token.is_cancelled() {
            return false;
        }
        let slice = remaining.min(quantum);
        tokio::select! {
            _ = token.cancelled() => return false,
            _ = time::sleep(slice) => {}
        }
        remaining = remaining.saturating_sub(slice);
    }

    !token.is_cancelled()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    struct Counter {
        calls: Arc<AtomicU32>,
        fail: bool,
    }

    #[async_trait]
    impl Payload for Counter {
        fn name(&self) -> &'static str {
            "counter"
        }

        async fn tick(&self) -> Result<(), TickError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(TickError::Unrecovered(vec!["db".into()]))
            } else {
                Ok(())
            }
        }
    }

    struct Panicky {
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Payload for Panicky {
        fn name(&self) -> &'static str {
            "panicky"
        }

        async fn tick(&self) -> Result<(), TickError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                panic!("first tick blows up");
            }
            Ok(())
        }
    }

    fn fast() -> SchedulerConfig {
        SchedulerConfig::new(Duration::from_millis(20))
            .poll_quantum(Duration::from_millis(5))
            .join_timeout(Duration::from_millis(500))
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = PeriodicTask::new(Counter { calls: calls.clone(), fail: false }, fast());

        assert_eq!(task.state(), SchedulerState::Idle);
        assert!(task.start());
        assert!(!task.start());
        assert_eq!(task.state(), SchedulerState::Running);

        assert!(task.stop().await);
        assert_eq!(task.state(), SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn test_disabled_never_starts() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = PeriodicTask::new(Counter { calls: calls.clone(), fail: false }, fast().enabled(false));

        assert!(!task.start());
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(task.stop().await);
    }

    #[tokio::test]
    async fn test_failing_ticks_keep_running() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = PeriodicTask::new(Counter { calls: calls.clone(), fail: true }, fast());

        task.start();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(task.is_running());
        assert!(calls.load(Ordering::SeqCst) >= 2);
        task.stop().await;
    }

    #[tokio::test]
    async fn test_panicking_tick_does_not_kill_loop() {
        let calls = Arc::new(AtomicU32::new(0));
        let task = PeriodicTask::new(Panicky { calls: calls.clone() }, fast());

        task.start();
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert!(task.is_running());
        assert!(calls.load(Ordering::SeqCst) >= 2);
        assert!(task.ticks() >= 2);
        task.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_mid_interval_is_prompt() {
        let calls = Arc::new(AtomicU32::new(0));
        let config = SchedulerConfig::new(Duration::from_secs(240))
            .poll_quantum(Duration::from_secs(10))
            .join_timeout(Duration::from_secs(5));
        let task = PeriodicTask::new(Counter { calls: calls.clone(), fail: false }, config);

        task.start();
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let started = tokio::time::Instant::now();
        assert!(task.stop().await);
        assert!(started.elapsed() <= Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sleep_interval_observes_cancel_within_quantum() {
        let token = CancellationToken::new();
        let cancel = token.clone();
        tokio::spawn(async move {
            time::sleep(Duration::from_secs(33)).await;
            cancel.cancel();
        });

        let started = tokio::time::Instant::now();
        let completed = sleep_interval(&token, Duration::from_secs(240), Duration::from_secs(10)).await;
        assert!(!completed);
        assert!(started.elapsed() <= Duration::from_secs(40));
    }
}
