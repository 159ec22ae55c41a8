//! Metrics collection and exposition.
//!
//! # Metrics
//! - `routing_snapshot_rebuilds_total{composite}` (counter): composite snapshots recomputed and cached
//! - `routing_change_notifications_total{composite, source}` (counter): constituent changes
//! - `routing_endpoints{composite}` (gauge): endpoints in the latest cached snapshot
//! - `routing_data_sources{composite}` (gauge): constituents registered in the composite
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed recorder it is a no-op
//! - The Prometheus exporter is only installed by the host binary

use std::net::SocketAddr;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_snapshot_rebuild(composite: &str, endpoints: usize) {
    metrics::counter!("routing_snapshot_rebuilds_total", "composite" => composite.to_string()).increment(1);
    metrics::gauge!("routing_endpoints", "composite" => composite.to_string()).set(endpoints as f64);
}

pub fn record_change_notification(composite: &str, source: &str) {
    metrics::counter!(
        "routing_change_notifications_total",
        "composite" => composite.to_string(),
        "source" => source.to_string()
    )
    .increment(1);
}

pub fn record_data_sources(composite: &str, count: usize) {
    metrics::gauge!("routing_data_sources", "composite" => composite.to_string()).set(count as f64);
}
