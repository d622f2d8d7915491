//! Liveness endpoint.
//!
//! The gateway has no backends of its own to probe; `/health` only reports
//! that the process is serving. Upstream reachability shows up in the
//! `gateway_upstream_requests_total` metric instead.

use axum::Json;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
