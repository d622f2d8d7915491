//! Upstream client.
//!
//! # Responsibilities
//! - Describe one outbound call (`UpstreamRequest`)
//! - Build provider URLs with every interpolated value percent-encoded
//! - Send the call once, with the shared client's timeout, and buffer the body
//!
//! # Design Decisions
//! - One `reqwest::Client` per process, shared immutably
//! - No retries, no circuit breaking: a failure is surfaced immediately
//! - Path segments and query values always go through `url::Url` encoding

use std::fmt;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use serde_json::Value;
use url::Url;

use crate::config::{TimeoutConfig, UpstreamsConfig};
use crate::observability::metrics;
use crate::proxy::error::{ProxyError, UpstreamFailure};

/// Third-party service an upstream request is addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    Alpaca,
    TwelveData,
    Yahoo,
    Fred,
    Calendar,
    Bluesky,
    Stripe,
    Supabase,
    Anthropic,
    HeyGen,
    LiveAvatar,
}

impl Provider {
    /// Stable lowercase label for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Alpaca => "alpaca",
            Self::TwelveData => "twelve_data",
            Self::Yahoo => "yahoo",
            Self::Fred => "fred",
            Self::Calendar => "calendar",
            Self::Bluesky => "bluesky",
            Self::Stripe => "stripe",
            Self::Supabase => "supabase",
            Self::Anthropic => "anthropic",
            Self::HeyGen => "heygen",
            Self::LiveAvatar => "liveavatar",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Alpaca => "Alpaca",
            Self::TwelveData => "Twelve Data",
            Self::Yahoo => "Yahoo Finance",
            Self::Fred => "FRED",
            Self::Calendar => "Economic calendar",
            Self::Bluesky => "Bluesky",
            Self::Stripe => "Stripe",
            Self::Supabase => "Supabase",
            Self::Anthropic => "Anthropic",
            Self::HeyGen => "HeyGen",
            Self::LiveAvatar => "LiveAvatar",
        };
        f.write_str(name)
    }
}

/// Outbound request body.
#[derive(Debug, Clone, Default)]
pub enum UpstreamBody {
    #[default]
    Empty,
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs, in order.
    Form(Vec<(String, String)>),
}

/// Description of one outbound call.
#[derive(Debug, Clone)]
pub struct UpstreamRequest {
    pub provider: Provider,
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(HeaderName, String)>,
    pub body: UpstreamBody,
}

impl UpstreamRequest {
    pub fn get(provider: Provider, url: Url) -> Self {
        Self {
            provider,
            method: Method::GET,
            url,
            headers: Vec::new(),
            body: UpstreamBody::Empty,
        }
    }

    pub fn post(provider: Provider, url: Url) -> Self {
        Self {
            method: Method::POST,
            ..Self::get(provider, url)
        }
    }

    pub fn delete(provider: Provider, url: Url) -> Self {
        Self {
            method: Method::DELETE,
            ..Self::get(provider, url)
        }
    }

    pub fn header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((HeaderName::from_static(name), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("authorization", format!("Bearer {token}"))
    }

    /// Attach both Alpaca key headers.
    pub fn alpaca_keys(self, keys: crate::config::credentials::AlpacaKeys<'_>) -> Self {
        self.header("apca-api-key-id", keys.key_id)
            .header("apca-api-secret-key", keys.secret)
    }

    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = UpstreamBody::Json(body);
        self
    }

    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = UpstreamBody::Form(pairs);
        self
    }
}

/// Build `base` + `segments`, percent-encoding each segment.
pub fn provider_url(base: &str, segments: &[&str]) -> Result<Url, ProxyError> {
    let mut url = Url::parse(base)
        .map_err(|e| ProxyError::unexpected(format!("invalid upstream base URL {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ProxyError::unexpected(format!("upstream base URL {base:?} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Buffered upstream answer.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub provider: Provider,
    pub status: StatusCode,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Success bodies as JSON; an empty body is `null`.
    pub fn into_json(self) -> Result<Value, ProxyError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body).map_err(|e| {
            ProxyError::unexpected(format!("{} returned invalid JSON: {e}", self.provider))
        })
    }

    /// Split into success bytes or a failure for the error mapper.
    pub fn into_result(self) -> Result<Self, UpstreamFailure> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(UpstreamFailure {
                provider: self.provider,
                status: self.status,
                body: String::from_utf8_lossy(&self.body).into_owned(),
            })
        }
    }
}

/// Shared outbound HTTP client.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
}

impl UpstreamClient {
    pub fn new(timeouts: &TimeoutConfig, upstreams: &UpstreamsConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeouts.upstream_secs))
            .user_agent(upstreams.user_agent.clone())
            .build()?;
        Ok(Self { http })
    }

    /// Send one request and buffer the full response.
    ///
    /// Only transport failures are errors here; any HTTP status is returned.
    pub async fn send(&self, request: UpstreamRequest) -> Result<UpstreamResponse, ProxyError> {
        let provider = request.provider;
        let start = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .header(reqwest::header::ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        builder = match request.body {
            UpstreamBody::Empty => builder,
            UpstreamBody::Json(body) => builder.json(&body),
            UpstreamBody::Form(pairs) => builder.form(&pairs),
        };

        tracing::debug!(
            provider = provider.as_str(),
            method = %request.method,
            path = request.url.path(),
            "Calling upstream"
        );

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream(provider, None, start);
                tracing::error!(provider = provider.as_str(), error = %e, "Upstream request failed");
                return Err(ProxyError::unexpected(format!("{provider} request failed: {e}")));
            }
        };

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            ProxyError::unexpected(format!("{provider} response could not be read: {e}"))
        })?;
        metrics::record_upstream(provider, Some(status), start);

        Ok(UpstreamResponse { provider, status, body })
    }
}
