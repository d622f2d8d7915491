//! Social sentiment: Bluesky post search.

use axum::http::Method;
use serde_json::Value;

use crate::proxy::{
    provider_url, CacheHint, Context, Endpoint, EndpointRequest, Provider, ProxyError,
    UpstreamRequest,
};

const DEFAULT_POST_LIMIT: u32 = 25;
const MAX_POST_LIMIT: u32 = 100;

/// GET /bluesky?q=&limit=: latest posts matching one query.
pub struct Bluesky {
    query: String,
    limit: u32,
}

impl Endpoint for Bluesky {
    const NAME: &'static str = "bluesky";
    const METHODS: &'static [Method] = &[Method::GET];
    const CACHE: Option<CacheHint> = Some(CacheHint::edge(30, Some(60)));

    type Payload = Value;
    type Output = Value;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self {
            query: request
                .require_param("q", "q query parameter required")?
                .to_string(),
            limit: request.limit_param("limit", DEFAULT_POST_LIMIT, MAX_POST_LIMIT),
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let url = provider_url(
            &ctx.config.upstreams.bluesky,
            &["xrpc", "app.bsky.feed.searchPosts"],
        )?;
        Ok(UpstreamRequest::get(Provider::Bluesky, url)
            .query("q", &self.query)
            .query("limit", &self.limit.to_string())
            .query("sort", "latest"))
    }

    fn normalize(self, posts: Value) -> Result<Value, ProxyError> {
        Ok(posts)
    }
}
