//! Metrics collection and exposition.
//!
//! # Metrics
//! - `notes_http_requests_total` (counter): requests by router, method, status
//! - `notes_http_request_duration_seconds` (histogram): latency by router
//! - `notes_http_in_flight` (gauge): application requests being handled
//!
//! # Design Decisions
//! - The Prometheus recorder is process-global, so it is installed at most
//!   once; later calls share the same handle
//! - Exposition happens on the health listener, never on application ports

use std::sync::OnceLock;
use std::time::Instant;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder, or return the one already installed.
///
/// Returns `None` if another recorder owns the global slot.
pub fn install_recorder() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                tracing::info!("Prometheus recorder installed");
                Some(handle)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to install Prometheus recorder");
                None
            }
        })
        .clone()
}

pub fn record_request(router: &'static str, method: String, status: u16, start: Instant) {
    metrics::counter!(
        "notes_http_requests_total",
        "router" => router,
        "method" => method,
        "status" => status.to_string()
    )
    .increment(1);

    metrics::histogram!("notes_http_request_duration_seconds", "router" => router)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_in_flight(in_flight: usize) {
    metrics::gauge!("notes_http_in_flight").set(in_flight as f64);
}
