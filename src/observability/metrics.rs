//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gws_requests_total` (counter): requests by method, status
//! - `gws_request_duration_seconds` (histogram): latency distribution
//! - `gws_csrf_rejections_total` (counter): rejected unsafe requests by reason
//! - `gws_auth_redirects_total` (counter): anonymous hits on gated routes
//! - `gws_session_events_total` (counter): login/logout outcomes
//!
//! Recording is a no-op until a recorder is installed, so tests and
//! deployments without the exporter pay almost nothing.

use std::net::SocketAddr;
use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    counter!("gws_requests_total", "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    histogram!("gws_request_duration_seconds", "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_csrf_rejection(reason: &'static str) {
    counter!("gws_csrf_rejections_total", "reason" => reason).increment(1);
}

pub fn record_auth_redirect() {
    counter!("gws_auth_redirects_total").increment(1);
}

pub fn record_session_event(event: &'static str, outcome: &'static str) {
    counter!("gws_session_events_total", "event" => event, "outcome" => outcome).increment(1);
}

/// Router-level middleware recording request counts and latency.
pub async fn track_requests(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let response = next.run(request).await;
    record_request(&method, response.status().as_u16(), start);
    response
}
