//! Response rewriting for errors raised outside the pipeline.
//!
//! The body-limit and timeout layers answer with their own bare 413 and 408
//! responses. These are replaced with the JSON error body every other failure
//! carries.

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::proxy::ProxyError;

pub async fn json_error_middleware(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if is_json(&response) {
        return response;
    }

    match response.status() {
        StatusCode::PAYLOAD_TOO_LARGE => ProxyError::PayloadTooLarge.into_response(),
        StatusCode::REQUEST_TIMEOUT => ProxyError::Timeout.into_response(),
        _ => response,
    }
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::ServiceExt;

    async fn status_through_middleware(status: StatusCode) -> (StatusCode, serde_json::Value) {
        let app = Router::new()
            .route("/", get(move || async move { status }))
            .layer(middleware::from_fn(json_error_middleware));
        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_bare_limit_and_timeout_become_json() {
        let (status, body) = status_through_middleware(StatusCode::PAYLOAD_TOO_LARGE).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body["error"], "Request body too large");

        let (status, body) = status_through_middleware(StatusCode::REQUEST_TIMEOUT).await;
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(body["error"], "Request timed out");
    }

    #[tokio::test]
    async fn test_other_responses_untouched() {
        let (status, body) = status_through_middleware(StatusCode::NO_CONTENT).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, serde_json::Value::Null);
    }
}
