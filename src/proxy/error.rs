//! Error mapping.
//!
//! Every failure a request can hit ends up as one [`ProxyError`], which
//! renders as a JSON object with an `error` field and the matching status.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::proxy::upstream::Provider;

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// A credential or setting the endpoint needs is absent.
    #[error("{0} not configured")]
    ConfigurationMissing(&'static str),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    NotFound(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Request timed out")]
    Timeout,

    /// Non-2xx upstream answer; the status is passed through.
    #[error("{error}")]
    Upstream {
        status: StatusCode,
        error: String,
        detail: Option<Value>,
    },

    #[error("{0}")]
    Unexpected(String),
}

impl ProxyError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ConfigurationMissing(_) | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
            Self::Upstream { status, .. } => *status,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<&'a Value>,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let detail = match &self {
            Self::Upstream { detail, .. } => detail.as_ref(),
            _ => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            detail,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// A non-2xx answer from an upstream provider, before endpoint-specific mapping.
#[derive(Debug, Clone)]
pub struct UpstreamFailure {
    pub provider: Provider,
    pub status: StatusCode,
    pub body: String,
}

impl UpstreamFailure {
    /// The body as JSON when it parses, otherwise as a string.
    pub fn detail(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|_| Value::String(self.body.clone()))
    }

    /// The provider's own error message, when the body carries one.
    ///
    /// Looks at `message`, `error.message` and a string `error`, in that order.
    pub fn message(&self) -> Option<String> {
        let detail: Value = serde_json::from_str(&self.body).ok()?;
        detail
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| detail.pointer("/error/message").and_then(Value::as_str))
            .or_else(|| detail.get("error").and_then(Value::as_str))
            .map(str::to_string)
    }

    /// Default mapping: pass the status through with the upstream detail.
    pub fn passthrough(self) -> ProxyError {
        ProxyError::Upstream {
            status: self.status,
            error: format!("{} API error: {}", self.provider, self.status.as_u16()),
            detail: Some(self.detail()),
        }
    }

    /// Pass the status through, preferring the provider's own message.
    pub fn passthrough_with_message(self) -> ProxyError {
        let error = self
            .message()
            .unwrap_or_else(|| format!("{} API error: {}", self.provider, self.status.as_u16()));
        ProxyError::Upstream {
            status: self.status,
            error,
            detail: Some(self.detail()),
        }
    }
}

impl From<UpstreamFailure> for ProxyError {
    fn from(failure: UpstreamFailure) -> Self {
        failure.passthrough()
    }
}
