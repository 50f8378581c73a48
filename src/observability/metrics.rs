//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pipeline_requests_total` (counter): requests by method, route, status
//! - `pipeline_request_duration_seconds` (histogram): latency distribution
//! - `pipeline_dispatch_violations_total` (counter): handler-chain defects by kind
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Route label is the registered pattern, never the raw path

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    metrics::counter!(
        "pipeline_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "pipeline_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_violation(kind: &'static str) {
    metrics::counter!("pipeline_dispatch_violations_total", "kind" => kind).increment(1);
}
