//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Record request, cache and backend metrics through the `metrics` facade
//! - Expose a Prometheus-compatible endpoint when the binary asks for one
//!
//! # Metrics
//! - `mock_requests_total` (counter): requests by method, status, strategy
//! - `mock_request_duration_seconds` (histogram): end-to-end latency
//! - `mock_cache_lookups_total` (counter): cache lookups by result (hit/miss)
//! - `mock_backend_attempts_total` (counter): backend attempts by outcome
//!
//! Without an installed recorder every call is a no-op, so library users and
//! tests pay nothing.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record one served request.
pub fn record_request(method: &str, status: u16, strategy: &'static str, start: Instant) {
    metrics::counter!(
        "mock_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "strategy" => strategy
    )
    .increment(1);
    metrics::histogram!("mock_request_duration_seconds", "strategy" => strategy)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_cache_lookup(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("mock_cache_lookups_total", "result" => result).increment(1);
}

/// `outcome` is one of `success`, `retry`, `failure`.
pub fn record_backend_attempt(outcome: &'static str) {
    metrics::counter!("mock_backend_attempts_total", "outcome" => outcome).increment(1);
}
