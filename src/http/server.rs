//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with every endpoint
//! - Wire up middleware (tracing, request ID, CORS, limits, timeout)
//! - Own the shared upstream client
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    limit::RequestBodyLimitLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Credentials, GatewayConfig};
use crate::endpoints;
use crate::http::middleware::json_error_middleware;
use crate::http::request::{request_id_header, UuidRequestId};
use crate::proxy::{Context, UpstreamClient};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Application state injected into handlers. Immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub credentials: Arc<Credentials>,
    pub upstream: UpstreamClient,
}

impl AppState {
    pub fn context(&self) -> Context<'_> {
        Context {
            config: &self.config,
            credentials: &self.credentials,
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: Arc<GatewayConfig>,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, credentials: Credentials) -> Result<Self, ServerError> {
        let upstream = UpstreamClient::new(&config.timeouts, &config.upstreams)?;
        let config = Arc::new(config);

        let state = AppState {
            config: config.clone(),
            credentials: Arc::new(credentials),
            upstream,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Each `Router::layer` call wraps everything added before it, so the
    /// limit and timeout layers sit innermost and their bare rejections pass
    /// through `json_error_middleware` before reaching the outer stack.
    #[allow(deprecated)]
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let outer = ServiceBuilder::new()
            .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(CorsLayer::permissive());

        endpoints::routes()
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(middleware::from_fn(json_error_middleware))
            .layer(outer)
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream_timeout_secs = self.config.timeouts.upstream_secs,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn into_router(self) -> Router {
        self.router
    }
}
