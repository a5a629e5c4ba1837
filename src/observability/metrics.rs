//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, status, route template
//! - `gateway_request_duration_seconds` (histogram): time to response head
//! - `gateway_upstream_failures_total` (counter): forwarding failures by upstream and kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Route label is the template (`/datasets/{dataset}`), never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Label used when no route matched.
pub const UNMATCHED_ROUTE: &str = "none";

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one handled request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

/// Record a forwarding failure.
pub fn record_upstream_failure(upstream: &str, kind: &'static str) {
    metrics::counter!(
        "gateway_upstream_failures_total",
        "upstream" => upstream.to_string(),
        "kind" => kind
    )
    .increment(1);
}
