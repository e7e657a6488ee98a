//! Metrics collection and exposition.
//!
//! # Metrics
//! - `muzhvay_requests_total` (counter): responses by method, status
//! - `muzhvay_request_duration_seconds` (histogram): accept-to-close latency
//! - `muzhvay_active_connections` (gauge): connections being handled
//! - `muzhvay_sessions_active` (gauge): sessions in the store
//! - `muzhvay_sessions_created_total` (counter)
//! - `muzhvay_sessions_killed_total` (counter): by reason
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless [`init_metrics`] runs.

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "muzhvay_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("muzhvay_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_active_connections(count: u64) {
    metrics::gauge!("muzhvay_active_connections").set(count as f64);
}

pub fn record_session_created(active: usize) {
    metrics::counter!("muzhvay_sessions_created_total").increment(1);
    metrics::gauge!("muzhvay_sessions_active").set(active as f64);
}

pub fn record_session_killed(reason: &'static str, active: usize) {
    metrics::counter!("muzhvay_sessions_killed_total", "reason" => reason).increment(1);
    metrics::gauge!("muzhvay_sessions_active").set(active as f64);
}
