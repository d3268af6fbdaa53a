//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_upstream_requests_total` (counter): upstream attempts by method, status
//! - `gateway_upstream_request_duration_seconds` (histogram): attempt latency
//! - `gateway_upstream_retries_total` (counter): attempts scheduled after a transient failure
//! - `gateway_circuit_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `gateway_logins_total` (counter): upstream logins by outcome
//! - `gateway_reauthentications_total` (counter): logins forced by a 401
//! - `gateway_rate_limited_total` (counter): inbound requests rejected with 429

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// One upstream attempt. `status` is 0 when no response arrived.
pub fn record_upstream_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_upstream_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_upstream_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(label: &str) {
    metrics::counter!("gateway_upstream_retries_total", "operation" => label.to_string())
        .increment(1);
}

pub fn record_circuit_state(state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::HalfOpen => 1.0,
        CircuitState::Open => 2.0,
    };
    metrics::gauge!("gateway_circuit_state").set(value);
}

pub fn record_login(outcome: &'static str) {
    metrics::counter!("gateway_logins_total", "outcome" => outcome).increment(1);
}

pub fn record_reauthentication() {
    metrics::counter!("gateway_reauthentications_total").increment(1);
}

pub fn record_rate_limited(reason: &'static str) {
    metrics::counter!("gateway_rate_limited_total", "reason" => reason).increment(1);
}
