//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.
//! Secrets never live here; see [`crate::config::Credentials`].

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request hardening.
    pub security: SecurityConfig,

    /// Base URLs of every upstream provider.
    pub upstreams: UpstreamsConfig,

    /// AI assistant, speech and avatar settings.
    pub assistant: AssistantConfig,

    /// Payment session settings.
    pub payments: PaymentsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for one inbound request, in seconds.
    pub request_secs: u64,

    /// Timeout applied by the upstream HTTP client to every outbound call, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 60,
            upstream_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Upstream provider base URLs.
///
/// Paths are appended segment by segment, so a base may carry a prefix path.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamsConfig {
    /// Alpaca market data API.
    pub alpaca_data: String,
    /// Alpaca trading API (paper or live).
    pub alpaca_trading: String,
    pub twelve_data: String,
    pub yahoo: String,
    pub fred: String,
    /// Base of the weekly economic calendar feed.
    pub calendar: String,
    pub bluesky: String,
    pub stripe: String,
    pub anthropic: String,
    pub heygen: String,
    pub liveavatar: String,
    /// User-Agent sent when an endpoint does not set its own.
    pub user_agent: String,
}

impl Default for UpstreamsConfig {
    fn default() -> Self {
        Self {
            alpaca_data: "https://data.alpaca.markets".to_string(),
            alpaca_trading: "https://paper-api.alpaca.markets".to_string(),
            twelve_data: "https://api.twelvedata.com".to_string(),
            yahoo: "https://query1.finance.yahoo.com".to_string(),
            fred: "https://api.stlouisfed.org".to_string(),
            calendar: "https://nfs.faireconomy.media".to_string(),
            bluesky: "https://public.api.bsky.app".to_string(),
            stripe: "https://api.stripe.com".to_string(),
            anthropic: "https://api.anthropic.com".to_string(),
            heygen: "https://api.heygen.com".to_string(),
            liveavatar: "https://api.liveavatar.com".to_string(),
            user_agent: concat!("market-gateway/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl UpstreamsConfig {
    /// All base URLs with their config key, for validation.
    pub fn base_urls(&self) -> [(&'static str, &str); 11] {
        [
            ("alpaca_data", &self.alpaca_data),
            ("alpaca_trading", &self.alpaca_trading),
            ("twelve_data", &self.twelve_data),
            ("yahoo", &self.yahoo),
            ("fred", &self.fred),
            ("calendar", &self.calendar),
            ("bluesky", &self.bluesky),
            ("stripe", &self.stripe),
            ("anthropic", &self.anthropic),
            ("heygen", &self.heygen),
            ("liveavatar", &self.liveavatar),
        ]
    }
}

/// AI assistant configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Anthropic model identifier.
    pub model: String,

    /// Completion token limit.
    pub max_tokens: u32,

    /// `anthropic-version` header value.
    pub api_version: String,

    /// HeyGen voice used for text-to-speech.
    pub voice_id: String,

    /// Maximum characters forwarded to text-to-speech.
    pub max_speech_chars: usize,

    /// LiveAvatar avatar identifier.
    pub avatar_id: String,

    /// LiveAvatar persona context identifier.
    pub avatar_context_id: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 1024,
            api_version: "2023-06-01".to_string(),
            voice_id: "0b41c487c6da4f5ba5782bbe462958e8".to_string(),
            max_speech_chars: 3000,
            avatar_id: "26393b8e-e944-4367-98ef-e2bc75c4b792".to_string(),
            avatar_context_id: "0ada154b-9ea5-4e2f-871f-e841ecc763fb".to_string(),
        }
    }
}

/// Payment session configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PaymentsConfig {
    /// Frontend origin used for checkout success/cancel and portal return URLs.
    /// Overridden by `APP_URL` / `VITE_APP_URL`.
    pub app_url: String,
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            app_url: "http://localhost:5173".to_string(),
        }
    }
}
