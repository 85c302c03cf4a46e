//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (requests, latency, per-task outcome, cache)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `fanout_requests_total` (counter): inbound requests by status
//! - `fanout_request_duration_seconds` (histogram): end-to-end latency
//! - `fanout_task_duration_seconds` (histogram): per field, by outcome
//! - `fanout_cache_lookups_total` (counter): by profile and hit/miss/stale
//! - `fanout_cache_entries` (gauge): stored cache entries
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; with no exporter installed
//!   every call is a no-op, so tests need no setup

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::cache::CacheStatus;

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one completed inbound request.
pub fn record_request(status: u16, started: Instant) {
    ::metrics::counter!("fanout_requests_total", "status" => status.to_string()).increment(1);
    ::metrics::histogram!("fanout_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// Record one finished task.
pub fn record_task(field: &str, elapsed: Duration, failed: bool) {
    let outcome = if failed { "error" } else { "ok" };
    ::metrics::histogram!(
        "fanout_task_duration_seconds",
        "field" => field.to_string(),
        "outcome" => outcome
    )
    .record(elapsed.as_secs_f64());
}

/// Record one cache lookup.
pub fn record_cache_lookup(profile: &str, status: CacheStatus) {
    ::metrics::counter!(
        "fanout_cache_lookups_total",
        "profile" => profile.to_string(),
        "status" => status.as_str()
    )
    .increment(1);
}

/// Record the current number of stored cache entries.
pub fn record_cache_size(entries: usize) {
    ::metrics::gauge!("fanout_cache_entries").set(entries as f64);
}
