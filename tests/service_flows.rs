//! Account, payment, brokerage and assistant flows, including the
//! two-step endpoints.

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

#[tokio::test]
async fn test_broker_disconnect_without_token_makes_no_upstream_call() {
    let upstream = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    for auth in [None, Some("Basic abc"), Some("Bearer ")] {
        let mut request = gateway
            .client
            .post(gateway.url("/broker-disconnect"))
            .json(&json!({ "broker": "alpaca" }));
        if let Some(auth) = auth {
            request = request.header("authorization", auth);
        }
        let res = request.send().await.unwrap();
        assert_eq!(res.status(), 401, "auth header {auth:?}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "Unauthorized");
    }
}

#[tokio::test]
async fn test_broker_disconnect_verifies_then_deletes() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .and(header("authorization", "Bearer user-jwt"))
        .and(header("apikey", "service-role-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "user-42" })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/broker_connections"))
        .and(query_param("user_id", "eq.user-42"))
        .and(query_param("broker", "eq.webull"))
        .and(header("authorization", "Bearer service-role-key"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/broker-disconnect"))
        .bearer_auth("user-jwt")
        .json(&json!({ "broker": "webull" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({ "success": true, "broker": "webull", "disconnected": true }));
}

#[tokio::test]
async fn test_broker_disconnect_rejected_token_is_unauthorized() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/user"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "msg": "invalid JWT" })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/broker-disconnect"))
        .bearer_auth("expired")
        .json(&json!({ "broker": "alpaca" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 401);
}

#[tokio::test]
async fn test_liveavatar_session_chains_token_into_start() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/token"))
        .and(header("x-api-key", "liveavatar-key"))
        .and(body_partial_json(json!({ "mode": "FULL", "avatar_persona": { "language": "en" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 1000,
            "data": { "session_id": "sess-1", "session_token": "tok-1" }
        })))
        .expect(1)
        .mount(&upstream)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/start"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "livekit_url": "wss://livekit.example", "livekit_client_token": "lk-1" }
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/liveavatar-session"))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({
            "session_id": "sess-1",
            "session_token": "tok-1",
            "livekit_url": "wss://livekit.example",
            "livekit_token": "lk-1"
        })
    );
}

#[tokio::test]
async fn test_liveavatar_token_failure_message() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sessions/token"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({ "code": 4002 })))
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway.client.post(gateway.url("/liveavatar-token")).send().await.unwrap();

    assert_eq!(res.status(), 402);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "Token generation failed");
}

#[tokio::test]
async fn test_checkout_session_form_body() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(header("authorization", "Bearer sk_test_gateway"))
        .and(body_string_contains("mode=subscription"))
        .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_pro"))
        .and(body_string_contains("metadata%5BuserId%5D=user-7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1", "url": "https://checkout.stripe.com/c/cs_test_1", "object": "checkout.session"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/create-checkout-session"))
        .json(&json!({ "priceId": "price_pro", "userId": "user-7", "userEmail": "u@example.com" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(
        body,
        json!({ "sessionId": "cs_test_1", "url": "https://checkout.stripe.com/c/cs_test_1" })
    );
}

#[tokio::test]
async fn test_stripe_error_message_is_surfaced() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/billing_portal/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "message": "No such customer: 'cus_x'", "type": "invalid_request_error" }
        })))
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/create-portal-session"))
        .json(&json!({ "customerId": "cus_x" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "No such customer: 'cus_x'");
    assert_eq!(body["detail"]["error"]["type"], "invalid_request_error");
}

#[tokio::test]
async fn test_trade_rejects_invalid_side_before_upstream() {
    let upstream = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/trade"))
        .json(&json!({ "symbol": "AAPL", "qty": 1, "side": "short", "type": "market", "time_in_force": "day" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_trade_submits_order() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/orders"))
        .and(body_partial_json(json!({ "symbol": "TSLA", "qty": "3", "side": "sell", "type": "limit", "limit_price": "250.5" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "ord-9", "status": "accepted", "symbol": "TSLA", "qty": "3", "filled_qty": "0",
            "side": "sell", "type": "limit", "time_in_force": "gtc", "limit_price": "250.5",
            "stop_price": null, "created_at": "2024-06-03T15:00:00Z"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/trade"))
        .json(&json!({
            "symbol": "tsla", "qty": 3, "side": "sell", "type": "limit",
            "time_in_force": "gtc", "limit_price": 250.5
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["id"], "ord-9");
    assert_eq!(body["type"], "limit");
    assert_eq!(body["stop_price"], Value::Null);
}

#[tokio::test]
async fn test_chat_returns_first_text_block() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/messages"))
        .and(header("x-api-key", "sk-ant-test"))
        .and(header("anthropic-version", "2023-06-01"))
        .and(body_partial_json(json!({ "messages": [{ "role": "user", "content": "buy 5 NVDA" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "content": [{ "type": "text", "text": "{\"symbol\":\"NVDA\",\"action\":\"buy\"}" }]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/chat"))
        .json(&json!({ "message": "buy 5 NVDA" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["response"], "{\"symbol\":\"NVDA\",\"action\":\"buy\"}");
}

#[tokio::test]
async fn test_speak_upstream_failure_is_bad_gateway() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/text_to_speech"))
        .respond_with(ResponseTemplate::new(500).set_body_string("voice unavailable"))
        .mount(&upstream)
        .await;

    let gateway = common::spawn_with_upstream(&upstream).await;
    let res = gateway
        .client
        .post(gateway.url("/speak"))
        .json(&json!({ "text": "Markets are up today." }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 502);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "HeyGen error: 500 voice unavailable");
}
