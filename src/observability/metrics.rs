//! Metrics collection and exposition.
//!
//! # Metrics
//! - `extension_http_requests_total` (counter): requests by endpoint
//! - `extension_status_polls_total` (counter): status polls by outcome
//!   (`passed`, `failed`, `errored`)
//! - `extension_fetch_retries_total` (counter): monitor fetch retries
//! - `extension_downtimes_total` (counter): downtime operations by op, result
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Outcome of a single status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Passed,
    Failed,
    Errored,
}

impl PollOutcome {
    fn as_str(self) -> &'static str {
        match self {
            PollOutcome::Passed => "passed",
            PollOutcome::Failed => "failed",
            PollOutcome::Errored => "errored",
        }
    }
}

pub fn record_request(endpoint: &'static str) {
    counter!("extension_http_requests_total", "endpoint" => endpoint).increment(1);
}

pub fn record_status_poll(outcome: PollOutcome) {
    counter!("extension_status_polls_total", "outcome" => outcome.as_str()).increment(1);
}

pub fn record_fetch_retry() {
    counter!("extension_fetch_retries_total").increment(1);
}

pub fn record_downtime(op: &'static str, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    counter!("extension_downtimes_total", "op" => op, "result" => result).increment(1);
}
