//! Metrics collection and exposition.
//!
//! # Metrics
//! - `view_dispatch_total` (counter): dispatches by view, handler, outcome
//! - `view_dispatch_duration_seconds` (histogram): handler + render latency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Outcome is `declared`, `fallback`, or the error class

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one dispatch.
pub fn record_dispatch(view: &str, handler: &str, outcome: &'static str, start_time: Instant) {
    let labels = [
        ("view", view.to_string()),
        ("handler", handler.to_string()),
        ("outcome", outcome.to_string()),
    ];
    counter!("view_dispatch_total", &labels).increment(1);
    histogram!("view_dispatch_duration_seconds", &labels).record(start_time.elapsed().as_secs_f64());
}
