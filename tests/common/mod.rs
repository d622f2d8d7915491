//! Shared utilities for integration tests.
//!
//! The gateway runs on an ephemeral port with every upstream base URL pointed
//! at one `wiremock` server.

#![allow(dead_code)]

use std::net::SocketAddr;

use market_gateway::config::{Credentials, GatewayConfig};
use market_gateway::{HttpServer, Shutdown};
use tokio::net::TcpListener;
use wiremock::MockServer;

/// A running gateway; shut down on drop.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    shutdown: Shutdown,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// Defaults with every provider routed to `upstream`.
pub fn config_for(upstream: &MockServer) -> GatewayConfig {
    let uri = upstream.uri();
    let mut config = GatewayConfig::default();
    let upstreams = &mut config.upstreams;
    for base in [
        &mut upstreams.alpaca_data,
        &mut upstreams.alpaca_trading,
        &mut upstreams.twelve_data,
        &mut upstreams.yahoo,
        &mut upstreams.fred,
        &mut upstreams.calendar,
        &mut upstreams.bluesky,
        &mut upstreams.stripe,
        &mut upstreams.anthropic,
        &mut upstreams.heygen,
        &mut upstreams.liveavatar,
    ] {
        *base = uri.clone();
    }
    config.timeouts.upstream_secs = 5;
    config
}

/// Every credential set; Supabase also lives on `upstream`.
pub fn all_credentials(upstream: &MockServer) -> Credentials {
    Credentials {
        alpaca_key_id: Some("test-key-id".into()),
        alpaca_secret: Some("test-secret".into()),
        twelve_data_key: Some("td-key".into()),
        fred_key: Some("fred-key".into()),
        stripe_secret: Some("sk_test_gateway".into()),
        supabase_url: Some(upstream.uri()),
        supabase_service_key: Some("service-role-key".into()),
        anthropic_key: Some("sk-ant-test".into()),
        heygen_key: Some("heygen-key".into()),
        liveavatar_key: Some("liveavatar-key".into()),
        app_url: Some("https://app.example.com".into()),
    }
}

pub async fn spawn_gateway(config: GatewayConfig, credentials: Credentials) -> TestGateway {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, credentials).unwrap();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    TestGateway {
        addr,
        client,
        shutdown,
    }
}

/// Gateway fully configured against `upstream`.
pub async fn spawn_with_upstream(upstream: &MockServer) -> TestGateway {
    spawn_gateway(config_for(upstream), all_credentials(upstream)).await
}
