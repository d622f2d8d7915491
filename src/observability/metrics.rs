//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by endpoint, method, status
//! - `gateway_request_duration_seconds` (histogram): latency by endpoint
//! - `gateway_upstream_requests_total` (counter): upstream calls by provider, status
//! - `gateway_upstream_duration_seconds` (histogram): upstream latency by provider
//!
//! Transport failures are recorded with status `error`.

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::{Method, StatusCode};
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::proxy::Provider;

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("metrics exporter installation failed: {0}")]
    Install(String),
}

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install(e.to_string()))?;

    describe_counter!("gateway_requests_total", "Requests handled, by endpoint and status");
    describe_histogram!(
        "gateway_request_duration_seconds",
        "End-to-end request latency"
    );
    describe_counter!(
        "gateway_upstream_requests_total",
        "Upstream calls, by provider and status"
    );
    describe_histogram!(
        "gateway_upstream_duration_seconds",
        "Upstream call latency"
    );

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_request(endpoint: &'static str, method: &Method, status: StatusCode, start: Instant) {
    counter!(
        "gateway_requests_total",
        "endpoint" => endpoint,
        "method" => method.to_string(),
        "status" => status.as_u16().to_string()
    )
    .increment(1);

    histogram!("gateway_request_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}

/// `status` is `None` when the call never produced a response.
pub fn record_upstream(provider: Provider, status: Option<StatusCode>, start: Instant) {
    let status = status.map_or_else(|| "error".to_string(), |s| s.as_u16().to_string());
    counter!(
        "gateway_upstream_requests_total",
        "provider" => provider.as_str(),
        "status" => status
    )
    .increment(1);

    histogram!("gateway_upstream_duration_seconds", "provider" => provider.as_str())
        .record(start.elapsed().as_secs_f64());
}
