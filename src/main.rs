//! Market data and services gateway.
//!
//! One stateless HTTP server in front of the third-party APIs the trading
//! frontend needs. Every endpoint validates its input, makes one upstream call
//! (two for a few chained flows), and returns a normalized JSON body.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request id, trace, CORS, timeout, body limit)
//!                         │
//!                         ▼
//!                     endpoints (route table)
//!                         │
//!                         ▼
//!                     proxy::pipeline
//!                       validate → upstream → [follow_up] → normalize
//!                         │                 │
//!                         │                 ▼
//!                         │           proxy::upstream ──────▶ Alpaca, Twelve Data,
//!                         │                                    Yahoo, FRED, Stripe,
//!                         ▼                                    Supabase, Anthropic, ...
//!     Client Response
//!     ◀────────────── JSON body or { "error": ... }
//!
//!     Cross-cutting: config, credentials (env), observability, lifecycle
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use market_gateway::config::validation::validate_config;
use market_gateway::config::{load_config, ConfigError, Credentials, GatewayConfig};
use market_gateway::observability::{logging, metrics};
use market_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "market-gateway", version, about = "Market data and services gateway")]
struct Args {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

fn resolve_config(args: &Args) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "market-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        upstream_timeout_secs = config.timeouts.upstream_secs,
        max_body_size = config.security.max_body_size,
        "Configuration loaded"
    );

    let credentials = Credentials::from_env();
    tracing::info!(
        providers = ?credentials.configured_providers(),
        "Credentials loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    shutdown.trigger_on_signal();

    let server = HttpServer::new(config, credentials)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
