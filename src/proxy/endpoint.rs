//! The proxy-endpoint template.
//!
//! An endpoint is declared by implementing [`Endpoint`]; the generic
//! pipeline in [`crate::proxy::pipeline`] runs
//! validate → upstream → (follow-up) → normalize, and maps every failure.

use axum::http::Method;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::config::{Credentials, GatewayConfig};
use crate::proxy::error::{ProxyError, UpstreamFailure};
use crate::proxy::upstream::UpstreamRequest;
use crate::proxy::validate::EndpointRequest;

/// Read-only view of process configuration handed to endpoints.
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub config: &'a GatewayConfig,
    pub credentials: &'a Credentials,
}

/// Edge cache hint rendered as `Cache-Control`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHint {
    pub s_maxage: u32,
    /// `None` renders a bare `stale-while-revalidate`.
    pub stale_while_revalidate: Option<u32>,
}

impl CacheHint {
    pub const fn edge(s_maxage: u32, stale_while_revalidate: Option<u32>) -> Self {
        Self {
            s_maxage,
            stale_while_revalidate,
        }
    }

    pub fn header_value(&self) -> String {
        match self.stale_while_revalidate {
            Some(swr) => format!("s-maxage={}, stale-while-revalidate={}", self.s_maxage, swr),
            None => format!("s-maxage={}, stale-while-revalidate", self.s_maxage),
        }
    }
}

/// Which upstream call of a request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    First,
    FollowUp,
}

/// A declaratively configured proxy endpoint.
///
/// The validated parameter set is the endpoint value itself.
pub trait Endpoint: Sized + Send + 'static {
    /// Label for logs and metrics.
    const NAME: &'static str;

    /// Accepted HTTP methods; anything else is 405.
    const METHODS: &'static [Method];

    const CACHE: Option<CacheHint> = None;

    /// Final upstream body shape.
    type Payload: DeserializeOwned;

    /// Caller-facing body.
    type Output: Serialize;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError>;

    /// Describe the first upstream call. Missing credentials fail here.
    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError>;

    /// Second call to the same provider, derived from the first response.
    fn follow_up(
        &mut self,
        _first: &Value,
        _ctx: &Context<'_>,
    ) -> Result<Option<UpstreamRequest>, ProxyError> {
        Ok(None)
    }

    fn normalize(self, payload: Self::Payload) -> Result<Self::Output, ProxyError>;

    /// Map a non-2xx upstream answer. Passes the status through by default.
    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        failure.passthrough()
    }
}
