//! Metrics collection and exposition.
//!
//! # Metrics
//! - `warden_probe_total` (counter): probes by resource, result
//! - `warden_resource_healthy` (gauge): 1=healthy, 0=unhealthy
//! - `warden_recoveries_total` (counter): recoveries by resource, outcome
//! - `warden_operation_attempts_total` (counter): runner attempts by outcome
//! - `warden_guard_fallbacks_total` (counter): degraded pages served
//! - `warden_scheduler_ticks_total` (counter): ticks by task, outcome

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_probe(resource: &str, healthy: bool) {
    let result = if healthy { "healthy" } else { "unhealthy" };
    metrics::counter!(
        "warden_probe_total",
        "resource" => resource.to_string(),
        "result" => result
    )
    .increment(1);
    metrics::gauge!("warden_resource_healthy", "resource" => resource.to_string())
        .set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_recovery(resource: &str, ok: bool) {
    metrics::counter!(
        "warden_recoveries_total",
        "resource" => resource.to_string(),
        "outcome" => if ok { "ok" } else { "failed" }
    )
    .increment(1);
}

/// `attempts` is the number of attempts the finished run used.
pub fn record_attempts(attempts: u32, outcome: &'static str) {
    metrics::counter!("warden_operation_attempts_total", "outcome" => outcome)
        .increment(u64::from(attempts));
}

pub fn record_guard_fallback() {
    metrics::counter!("warden_guard_fallbacks_total").increment(1);
}

pub fn record_tick(task: &'static str, outcome: &'static str) {
    metrics::counter!("warden_scheduler_ticks_total", "task" => task, "outcome" => outcome)
        .increment(1);
}
