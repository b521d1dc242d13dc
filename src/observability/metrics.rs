//! Metrics collection and exposition.
//!
//! # Metrics
//! - `access_rule_writes_total` (counter): store writes by `op` (create, update, delete)
//! - `access_rules_skipped_total` (counter): records skipped while listing, by `reason`
//! - `access_entries_listed_total` (counter): access entries returned by searches
//! - `access_rule_store_size` (gauge): records held by the route store
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op
//! - Prometheus exposition is opt-in via config

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Install the Prometheus recorder and its HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_rule_write(op: &'static str) {
    metrics::counter!("access_rule_writes_total", "op" => op).increment(1);
}

pub fn record_rule_skipped(reason: &'static str) {
    metrics::counter!("access_rules_skipped_total", "reason" => reason).increment(1);
}

pub fn record_entries_listed(count: usize) {
    metrics::counter!("access_entries_listed_total").increment(count as u64);
}

pub fn record_store_size(size: usize) {
    metrics::gauge!("access_rule_store_size").set(size as f64);
}
