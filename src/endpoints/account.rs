//! Per-user account operations backed by Supabase.
//!
//! The caller's bearer token is verified against Supabase auth first; the
//! service-role key is only used once the user id is known.

use axum::http::Method;
use serde::Serialize;
use serde_json::Value;

use crate::proxy::{
    provider_url, Context, Endpoint, EndpointRequest, Provider, ProxyError, Step, UpstreamFailure,
    UpstreamRequest,
};

/// POST /broker-disconnect: delete the caller's stored broker connection.
#[derive(Debug)]
pub struct BrokerDisconnect {
    token: String,
    broker: String,
    user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DisconnectOutput {
    pub success: bool,
    pub broker: String,
    pub disconnected: bool,
}

impl Endpoint for BrokerDisconnect {
    const NAME: &'static str = "broker_disconnect";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = Value;
    type Output = DisconnectOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let token = request.bearer_token()?;
        let [broker] = request.require_body_strs(["broker"], "Missing broker field")?;
        Ok(Self {
            token,
            broker,
            user_id: None,
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let supabase = ctx.credentials.supabase()?;
        let url = provider_url(supabase.url, &["auth", "v1", "user"])?;
        Ok(UpstreamRequest::get(Provider::Supabase, url)
            .header("apikey", supabase.service_key)
            .bearer(&self.token))
    }

    fn follow_up(
        &mut self,
        user: &Value,
        ctx: &Context<'_>,
    ) -> Result<Option<UpstreamRequest>, ProxyError> {
        let user_id = user
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or(ProxyError::Unauthorized)?;
        self.user_id = Some(user_id.to_string());

        let supabase = ctx.credentials.supabase()?;
        let url = provider_url(supabase.url, &["rest", "v1", "broker_connections"])?;
        Ok(Some(
            UpstreamRequest::delete(Provider::Supabase, url)
                .query("user_id", &format!("eq.{user_id}"))
                .query("broker", &format!("eq.{}", self.broker))
                .header("apikey", supabase.service_key)
                .bearer(supabase.service_key)
                .header("prefer", "return=minimal"),
        ))
    }

    fn normalize(self, _deleted: Value) -> Result<DisconnectOutput, ProxyError> {
        tracing::info!(
            user_id = self.user_id.as_deref().unwrap_or_default(),
            broker = %self.broker,
            "Broker connection removed"
        );
        Ok(DisconnectOutput {
            success: true,
            broker: self.broker,
            disconnected: true,
        })
    }

    fn upstream_failure(&self, step: Step, failure: UpstreamFailure) -> ProxyError {
        match step {
            // Supabase rejects unknown or expired tokens with 4xx.
            Step::First if failure.status.is_client_error() => ProxyError::Unauthorized,
            _ => failure.passthrough_with_message(),
        }
    }
}
