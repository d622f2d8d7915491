//! Request validation.
//!
//! # Responsibilities
//! - Collect method, query, path parameters, headers and JSON body
//! - Provide the checks endpoints compose in `Endpoint::validate`
//!
//! # Design Decisions
//! - Pure: no I/O, no upstream calls
//! - Errors are already `ProxyError`s (400 / 401)

use std::collections::HashMap;

use axum::http::{header, HeaderMap, Method};
use serde_json::Value;
use url::form_urlencoded;

use crate::proxy::ProxyError;

/// Everything an endpoint may look at while validating.
#[derive(Debug, Clone)]
pub struct EndpointRequest {
    pub method: Method,
    pub query: HashMap<String, String>,
    pub path: HashMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Value>,
}

impl EndpointRequest {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            query: HashMap::new(),
            path: HashMap::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Decode a raw query string. Later duplicates win.
    pub fn with_query_string(mut self, raw: Option<&str>) -> Self {
        if let Some(raw) = raw {
            self.query
                .extend(form_urlencoded::parse(raw.as_bytes()).into_owned());
        }
        self
    }

    pub fn with_path(mut self, path: HashMap<String, String>) -> Self {
        self.path = path;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Parse a JSON body. Empty bodies are `None`.
    pub fn with_body_bytes(mut self, bytes: &[u8]) -> Result<Self, ProxyError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(self);
        }
        let body = serde_json::from_slice(bytes)
            .map_err(|e| ProxyError::invalid(format!("Invalid JSON body: {e}")))?;
        self.body = Some(body);
        Ok(self)
    }

    /// A query parameter or path parameter, trimmed, empty treated as absent.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.path
            .get(name)
            .or_else(|| self.query.get(name))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn require_param(&self, name: &str, message: &str) -> Result<&str, ProxyError> {
        self.param(name).ok_or_else(|| ProxyError::invalid(message))
    }

    /// Integer parameter clamped into `1..=max`; absent or unparsable is `default`.
    pub fn limit_param(&self, name: &str, default: u32, max: u32) -> u32 {
        self.param(name)
            .and_then(|l| l.parse::<i64>().ok())
            .map(|l| l.clamp(1, i64::from(max)) as u32)
            .unwrap_or(default)
    }

    /// Upper-cased ticker symbol, rejecting missing or over-long values.
    pub fn symbol(&self, name: &str, max_len: usize) -> Result<String, ProxyError> {
        match self.param(name) {
            Some(symbol) if symbol.chars().count() <= max_len => Ok(symbol.to_uppercase()),
            _ => Err(ProxyError::invalid("Invalid symbol")),
        }
    }

    /// A body field rendered as a string (numbers included), empty treated as absent.
    pub fn body_str(&self, field: &str) -> Option<String> {
        match self.body.as_ref()?.get(field)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn body_field(&self, field: &str) -> Option<&Value> {
        self.body.as_ref()?.get(field).filter(|v| !v.is_null())
    }

    /// All listed body fields, or 400 with `message`.
    pub fn require_body_strs<const N: usize>(
        &self,
        fields: [&str; N],
        message: &str,
    ) -> Result<[String; N], ProxyError> {
        let mut values: [String; N] = std::array::from_fn(|_| String::new());
        for (slot, field) in values.iter_mut().zip(fields) {
            *slot = self.body_str(field).ok_or_else(|| ProxyError::invalid(message))?;
        }
        Ok(values)
    }

    /// Token from `Authorization: Bearer <token>`; anything else is 401.
    pub fn bearer_token(&self) -> Result<String, ProxyError> {
        let value = self
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ProxyError::Unauthorized)?;
        let token = value
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty() && !t.contains(char::is_whitespace))
            .ok_or(ProxyError::Unauthorized)?;
        Ok(token.to_string())
    }
}
