//! Economic data: FRED series and the weekly economic calendar.

use axum::http::Method;
use serde_json::Value;

use crate::proxy::{
    provider_url, CacheHint, Context, Endpoint, EndpointRequest, Provider, ProxyError,
    UpstreamRequest,
};

/// GET /fred: series search, or observations for one series.
#[derive(Debug, PartialEq)]
pub enum Fred {
    Search { text: String },
    Observations { series_id: String },
}

impl Endpoint for Fred {
    const NAME: &'static str = "fred";
    const METHODS: &'static [Method] = &[Method::GET];
    const CACHE: Option<CacheHint> = Some(CacheHint::edge(300, Some(600)));

    type Payload = Value;
    type Output = Value;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        if request.param("endpoint") == Some("search") {
            let text = request.require_param("search_text", "search_text required")?;
            Ok(Self::Search {
                text: text.to_string(),
            })
        } else {
            let series_id = request.require_param("series_id", "series_id required")?;
            Ok(Self::Observations {
                series_id: series_id.to_string(),
            })
        }
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let key = ctx.credentials.fred()?;
        let base = &ctx.config.upstreams.fred;
        let request = match self {
            Self::Search { text } => UpstreamRequest::get(
                Provider::Fred,
                provider_url(base, &["fred", "series", "search"])?,
            )
            .query("search_text", text)
            .query("limit", "10"),
            Self::Observations { series_id } => UpstreamRequest::get(
                Provider::Fred,
                provider_url(base, &["fred", "series", "observations"])?,
            )
            .query("series_id", series_id)
            .query("sort_order", "desc")
            .query("limit", "60"),
        };
        Ok(request.query("api_key", key).query("file_type", "json"))
    }

    fn normalize(self, payload: Value) -> Result<Value, ProxyError> {
        Ok(payload)
    }
}

/// GET /economic-calendar: this week's events, passed through.
pub struct EconomicCalendar;

impl Endpoint for EconomicCalendar {
    const NAME: &'static str = "economic_calendar";
    const METHODS: &'static [Method] = &[Method::GET];
    const CACHE: Option<CacheHint> = Some(CacheHint::edge(300, Some(60)));

    type Payload = Value;
    type Output = Value;

    fn validate(_request: &EndpointRequest) -> Result<Self, ProxyError> {
        Ok(Self)
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let url = provider_url(&ctx.config.upstreams.calendar, &["ff_calendar_thisweek.json"])?;
        Ok(UpstreamRequest::get(Provider::Calendar, url))
    }

    fn normalize(self, events: Value) -> Result<Value, ProxyError> {
        Ok(events)
    }
}
