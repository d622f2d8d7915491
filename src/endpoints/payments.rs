//! Stripe subscription checkout and billing portal sessions.
//!
//! Stripe takes form-encoded bodies with bracketed keys
//! (`line_items[0][price]`); the pairs are built here in order and encoded
//! by the upstream client.

use axum::http::Method;
use serde::{Deserialize, Serialize};

use crate::proxy::{
    provider_url, Context, Endpoint, EndpointRequest, Provider, ProxyError, Step, UpstreamFailure,
    UpstreamRequest,
};

/// Public origin used in redirect URLs.
fn app_origin<'a>(ctx: &Context<'a>) -> &'a str {
    ctx.credentials
        .app_url
        .as_deref()
        .unwrap_or(&ctx.config.payments.app_url)
        .trim_end_matches('/')
}

fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// POST /create-checkout-session
#[derive(Debug)]
pub struct CheckoutSession {
    price_id: String,
    user_id: String,
    user_email: String,
}

#[derive(Debug, Deserialize)]
pub struct StripeCheckoutSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutput {
    pub session_id: String,
    pub url: Option<String>,
}

impl CheckoutSession {
    fn form(&self, origin: &str) -> Vec<(String, String)> {
        let success_url = format!("{origin}/dashboard?session_id={{CHECKOUT_SESSION_ID}}");
        let cancel_url = format!("{origin}/pricing");
        pairs(&[
            ("mode", "subscription"),
            ("payment_method_types[0]", "card"),
            ("line_items[0][price]", self.price_id.as_str()),
            ("line_items[0][quantity]", "1"),
            ("success_url", success_url.as_str()),
            ("cancel_url", cancel_url.as_str()),
            ("client_reference_id", self.user_id.as_str()),
            ("customer_email", self.user_email.as_str()),
            ("metadata[userId]", self.user_id.as_str()),
        ])
    }
}

impl Endpoint for CheckoutSession {
    const NAME: &'static str = "create_checkout_session";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = StripeCheckoutSession;
    type Output = CheckoutOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let [price_id, user_id, user_email] = request.require_body_strs(
            ["priceId", "userId", "userEmail"],
            "Missing required fields: priceId, userId, userEmail",
        )?;
        Ok(Self {
            price_id,
            user_id,
            user_email,
        })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let secret = ctx.credentials.stripe()?;
        let url = provider_url(&ctx.config.upstreams.stripe, &["v1", "checkout", "sessions"])?;
        Ok(UpstreamRequest::post(Provider::Stripe, url)
            .bearer(secret)
            .form(self.form(app_origin(ctx))))
    }

    fn normalize(self, session: StripeCheckoutSession) -> Result<CheckoutOutput, ProxyError> {
        Ok(CheckoutOutput {
            session_id: session.id,
            url: session.url,
        })
    }

    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        failure.passthrough_with_message()
    }
}

/// POST /create-portal-session
#[derive(Debug)]
pub struct PortalSession {
    customer_id: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PortalOutput {
    pub url: String,
}

impl Endpoint for PortalSession {
    const NAME: &'static str = "create_portal_session";
    const METHODS: &'static [Method] = &[Method::POST];

    type Payload = PortalOutput;
    type Output = PortalOutput;

    fn validate(request: &EndpointRequest) -> Result<Self, ProxyError> {
        let [customer_id] =
            request.require_body_strs(["customerId"], "Missing required field: customerId")?;
        Ok(Self { customer_id })
    }

    fn upstream(&self, ctx: &Context<'_>) -> Result<UpstreamRequest, ProxyError> {
        let secret = ctx.credentials.stripe()?;
        let url = provider_url(
            &ctx.config.upstreams.stripe,
            &["v1", "billing_portal", "sessions"],
        )?;
        let return_url = format!("{}/dashboard", app_origin(ctx));
        Ok(UpstreamRequest::post(Provider::Stripe, url)
            .bearer(secret)
            .form(pairs(&[
                ("customer", self.customer_id.as_str()),
                ("return_url", return_url.as_str()),
            ])))
    }

    fn normalize(self, session: PortalOutput) -> Result<PortalOutput, ProxyError> {
        Ok(session)
    }

    fn upstream_failure(&self, _step: Step, failure: UpstreamFailure) -> ProxyError {
        failure.passthrough_with_message()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Credentials, GatewayConfig};
    use crate::proxy::upstream::UpstreamBody;
    use serde_json::json;

    fn post(body: serde_json::Value) -> EndpointRequest {
        EndpointRequest::new(Method::POST)
            .with_body_bytes(body.to_string().as_bytes())
            .unwrap()
    }

    fn credentials() -> Credentials {
        Credentials::from_lookup(|name| match name {
            "STRIPE_SECRET_KEY" => Some("sk_test_123".to_string()),
            "APP_URL" => Some("https://app.example.com/".to_string()),
            _ => None,
        })
    }

    #[test]
    fn test_checkout_form_fields() {
        let config = GatewayConfig::default();
        let credentials = credentials();
        let ctx = Context { config: &config, credentials: &credentials };

        let endpoint = CheckoutSession::validate(&post(json!({
            "priceId": "price_pro", "userId": "user-7", "userEmail": "u@example.com"
        })))
        .unwrap();
        let request = endpoint.upstream(&ctx).unwrap();

        assert_eq!(request.url.path(), "/v1/checkout/sessions");
        assert!(request
            .headers
            .iter()
            .any(|(name, value)| name == "authorization" && value == "Bearer sk_test_123"));
        let UpstreamBody::Form(form) = request.body else {
            panic!("expected form body");
        };
        let get = |key: &str| form.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
        assert_eq!(get("mode"), Some("subscription"));
        assert_eq!(get("line_items[0][price]"), Some("price_pro"));
        assert_eq!(get("line_items[0][quantity]"), Some("1"));
        assert_eq!(
            get("success_url"),
            Some("https://app.example.com/dashboard?session_id={CHECKOUT_SESSION_ID}")
        );
        assert_eq!(get("cancel_url"), Some("https://app.example.com/pricing"));
        assert_eq!(get("metadata[userId]"), Some("user-7"));
        assert_eq!(get("customer_email"), Some("u@example.com"));
    }

    #[test]
    fn test_checkout_missing_fields() {
        let err = CheckoutSession::validate(&post(json!({ "priceId": "p" }))).unwrap_err();
        assert!(matches!(err, ProxyError::InvalidInput(m) if m.contains("userEmail")));
    }

    #[test]
    fn test_portal_without_secret_is_configuration_error() {
        let config = GatewayConfig::default();
        let credentials = Credentials::default();
        let ctx = Context { config: &config, credentials: &credentials };
        let endpoint = PortalSession::validate(&post(json!({ "customerId": "cus_1" }))).unwrap();
        assert!(matches!(endpoint.upstream(&ctx), Err(ProxyError::ConfigurationMissing(_))));
    }
}
