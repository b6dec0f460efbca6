//! Metrics collection and exposition.
//!
//! # Metrics
//! - `transfer_loop_submitted_total` (counter): broadcasts accepted by the node
//! - `transfer_loop_confirmed_total` (counter): transfers confirmed
//! - `transfer_loop_failures_total` (counter): failures by kind
//! - `transfer_loop_retries_total` (counter): retries by stage
//! - `transfer_loop_confirmation_seconds` (histogram): submit-to-confirm latency
//! - `transfer_loop_in_flight` (gauge): 1 while the loop waits on a confirmation
//!
//! Recording is a no-op until [`init_metrics`] installs the exporter.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint. Must run inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to start metrics endpoint"),
    }
}

pub fn record_submitted() {
    metrics::counter!("transfer_loop_submitted_total").increment(1);
    metrics::gauge!("transfer_loop_in_flight").set(1.0);
}

pub fn record_confirmed(latency: Duration) {
    metrics::counter!("transfer_loop_confirmed_total").increment(1);
    metrics::histogram!("transfer_loop_confirmation_seconds").record(latency.as_secs_f64());
    metrics::gauge!("transfer_loop_in_flight").set(0.0);
}

/// Record a failure. `settled` is true when nothing remains in flight.
pub fn record_failure(kind: &'static str, settled: bool) {
    metrics::counter!("transfer_loop_failures_total", "kind" => kind).increment(1);
    if settled {
        metrics::gauge!("transfer_loop_in_flight").set(0.0);
    }
}

pub fn record_retry(stage: &'static str) {
    metrics::counter!("transfer_loop_retries_total", "stage" => stage).increment(1);
}

/// The loop stopped watching the current transaction.
pub fn clear_in_flight() {
    metrics::gauge!("transfer_loop_in_flight").set(0.0);
}
