//! Generic request pipeline shared by every endpoint.
//!
//! # Data Flow
//! ```text
//! axum request
//!     → method check (405)
//!     → EndpointRequest (query, path, headers, JSON body)
//!     → E::validate (400 / 401)
//!     → E::upstream → UpstreamClient::send
//!     → [E::follow_up → UpstreamClient::send]   (two-step endpoints only)
//!     → E::Payload (serde) → E::normalize → JSON 200 (+ Cache-Control)
//! any failure
//!     → ProxyError → JSON error body
//! ```

use std::collections::HashMap;
use std::error::Error as _;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;

use crate::http::server::AppState;
use crate::http::X_REQUEST_ID;
use crate::observability::metrics;
use crate::proxy::endpoint::{Endpoint, Step};
use crate::proxy::validate::EndpointRequest;
use crate::proxy::ProxyError;

/// Handler for routes without path captures.
pub async fn dispatch<E: Endpoint>(State(state): State<AppState>, request: Request<Body>) -> Response {
    run::<E>(state, HashMap::new(), request).await
}

/// Handler for routes with path captures (e.g. `/stock/{symbol}`).
pub async fn dispatch_with_path<E: Endpoint>(
    State(state): State<AppState>,
    Path(path): Path<HashMap<String, String>>,
    request: Request<Body>,
) -> Response {
    run::<E>(state, path, request).await
}

async fn run<E: Endpoint>(
    state: AppState,
    path: HashMap<String, String>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let method = request.method().clone();
    let request_id = request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    // Preflight; the CORS layer adds the allow headers.
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    tracing::debug!(
        request_id = %request_id,
        endpoint = E::NAME,
        method = %method,
        "Handling request"
    );

    let response = match execute::<E>(&state, path, request).await {
        Ok(response) => response,
        Err(err) => {
            let status = err.status();
            if status.is_server_error() {
                tracing::error!(request_id = %request_id, endpoint = E::NAME, status = status.as_u16(), error = %err, "Request failed");
            } else {
                tracing::warn!(request_id = %request_id, endpoint = E::NAME, status = status.as_u16(), error = %err, "Request rejected");
            }
            err.into_response()
        }
    };

    metrics::record_request(E::NAME, &method, response.status(), start_time);
    response
}

async fn execute<E: Endpoint>(
    state: &AppState,
    path: HashMap<String, String>,
    request: Request<Body>,
) -> Result<Response, ProxyError> {
    if !E::METHODS.contains(request.method()) {
        return Err(ProxyError::MethodNotAllowed);
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, state.config.security.max_body_size)
        .await
        .map_err(|e| {
            if exceeds_length_limit(&e) {
                ProxyError::PayloadTooLarge
            } else {
                ProxyError::invalid(format!("Request body could not be read: {e}"))
            }
        })?;

    let endpoint_request = EndpointRequest::new(parts.method)
        .with_query_string(parts.uri.query())
        .with_path(path)
        .with_headers(parts.headers)
        .with_body_bytes(&bytes)?;

    let mut endpoint = E::validate(&endpoint_request)?;
    let ctx = state.context();

    let first_request = endpoint.upstream(&ctx)?;
    let first = state
        .upstream
        .send(first_request)
        .await?
        .into_result()
        .map_err(|failure| endpoint.upstream_failure(Step::First, failure))?
        .into_json()?;

    let payload = match endpoint.follow_up(&first, &ctx)? {
        Some(second_request) => state
            .upstream
            .send(second_request)
            .await?
            .into_result()
            .map_err(|failure| endpoint.upstream_failure(Step::FollowUp, failure))?
            .into_json()?,
        None => first,
    };

    let payload: E::Payload = serde_json::from_value(payload)
        .map_err(|e| ProxyError::unexpected(format!("Unexpected upstream payload: {e}")))?;
    let output = endpoint.normalize(payload)?;

    let mut response = (StatusCode::OK, Json(output)).into_response();
    if let Some(hint) = E::CACHE {
        if let Ok(value) = HeaderValue::from_str(&hint.header_value()) {
            response.headers_mut().insert(header::CACHE_CONTROL, value);
        }
    }
    Ok(response)
}

/// Whether a body read failed on a size cap, either ours or the
/// body-limit layer's. Both surface as `LengthLimitError` somewhere in the
/// source chain.
fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut current: Option<&(dyn std::error::Error + 'static)> = err.source();
    while let Some(cause) = current {
        if cause.is::<LengthLimitError>() {
            return true;
        }
        current = cause.source();
    }
    false
}
