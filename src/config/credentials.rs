//! Upstream credentials, loaded from environment variables.
//!
//! A credential that is absent only disables the endpoints that need it:
//! those fail with [`ProxyError::ConfigurationMissing`] at request time.

use crate::proxy::ProxyError;

/// Alpaca key pair.
#[derive(Clone, Copy)]
pub struct AlpacaKeys<'a> {
    pub key_id: &'a str,
    pub secret: &'a str,
}

/// Supabase project URL and service-role key.
#[derive(Clone, Copy)]
pub struct SupabaseKeys<'a> {
    pub url: &'a str,
    pub service_key: &'a str,
}

/// Every secret the gateway may attach to an upstream request.
#[derive(Clone, Default)]
pub struct Credentials {
    pub alpaca_key_id: Option<String>,
    pub alpaca_secret: Option<String>,
    pub twelve_data_key: Option<String>,
    pub fred_key: Option<String>,
    pub stripe_secret: Option<String>,
    pub supabase_url: Option<String>,
    pub supabase_service_key: Option<String>,
    pub anthropic_key: Option<String>,
    pub heygen_key: Option<String>,
    pub liveavatar_key: Option<String>,
    /// Frontend origin override for payment redirect URLs.
    pub app_url: Option<String>,
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup. The first non-empty
    /// (after trimming) variable of each alias list wins.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |names: &[&str]| {
            names.iter().find_map(|name| {
                lookup(name)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            })
        };

        Self {
            alpaca_key_id: first(&["ALPACA_API_KEY", "APCA_API_KEY_ID"]),
            alpaca_secret: first(&["ALPACA_API_SECRET", "ALPACA_SECRET_KEY", "APCA_API_SECRET_KEY"]),
            twelve_data_key: first(&["TWELVE_DATA_API_KEY"]),
            fred_key: first(&["FRED_API_KEY"]),
            stripe_secret: first(&["STRIPE_SECRET_KEY"]),
            supabase_url: first(&["SUPABASE_URL", "VITE_SUPABASE_URL"]),
            supabase_service_key: first(&["SUPABASE_SERVICE_ROLE_KEY"]),
            anthropic_key: first(&["ANTHROPIC_API_KEY"]),
            heygen_key: first(&["HEYGEN_API_KEY"]),
            liveavatar_key: first(&["LIVEAVATAR_API_KEY"]),
            app_url: first(&["APP_URL", "VITE_APP_URL"]),
        }
    }

    pub fn alpaca(&self) -> Result<AlpacaKeys<'_>, ProxyError> {
        match (&self.alpaca_key_id, &self.alpaca_secret) {
            (Some(key_id), Some(secret)) => Ok(AlpacaKeys { key_id, secret }),
            _ => Err(ProxyError::ConfigurationMissing("Alpaca API keys")),
        }
    }

    pub fn twelve_data(&self) -> Result<&str, ProxyError> {
        required(&self.twelve_data_key, "TWELVE_DATA_API_KEY")
    }

    pub fn fred(&self) -> Result<&str, ProxyError> {
        required(&self.fred_key, "FRED_API_KEY")
    }

    pub fn stripe(&self) -> Result<&str, ProxyError> {
        required(&self.stripe_secret, "Stripe secret key")
    }

    pub fn supabase(&self) -> Result<SupabaseKeys<'_>, ProxyError> {
        match (&self.supabase_url, &self.supabase_service_key) {
            (Some(url), Some(service_key)) => Ok(SupabaseKeys { url, service_key }),
            _ => Err(ProxyError::ConfigurationMissing("Supabase server credentials")),
        }
    }

    pub fn anthropic(&self) -> Result<&str, ProxyError> {
        required(&self.anthropic_key, "ANTHROPIC_API_KEY")
    }

    pub fn heygen(&self) -> Result<&str, ProxyError> {
        required(&self.heygen_key, "HEYGEN_API_KEY")
    }

    pub fn liveavatar(&self) -> Result<&str, ProxyError> {
        required(&self.liveavatar_key, "LiveAvatar API key")
    }

    /// Names of the providers that have complete credentials, for startup logs.
    pub fn configured_providers(&self) -> Vec<&'static str> {
        let mut providers = Vec::new();
        if self.alpaca().is_ok() {
            providers.push("alpaca");
        }
        if self.twelve_data_key.is_some() {
            providers.push("twelve_data");
        }
        if self.fred_key.is_some() {
            providers.push("fred");
        }
        if self.stripe_secret.is_some() {
            providers.push("stripe");
        }
        if self.supabase().is_ok() {
            providers.push("supabase");
        }
        if self.anthropic_key.is_some() {
            providers.push("anthropic");
        }
        if self.heygen_key.is_some() {
            providers.push("heygen");
        }
        if self.liveavatar_key.is_some() {
            providers.push("liveavatar");
        }
        providers
    }
}

fn required<'a>(value: &'a Option<String>, what: &'static str) -> Result<&'a str, ProxyError> {
    value.as_deref().ok_or(ProxyError::ConfigurationMissing(what))
}

fn redact(value: &Option<String>) -> &'static str {
    if value.is_some() {
        "[REDACTED]"
    } else {
        "<unset>"
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("alpaca_key_id", &redact(&self.alpaca_key_id))
            .field("alpaca_secret", &redact(&self.alpaca_secret))
            .field("twelve_data_key", &redact(&self.twelve_data_key))
            .field("fred_key", &redact(&self.fred_key))
            .field("stripe_secret", &redact(&self.stripe_secret))
            .field("supabase_url", &self.supabase_url)
            .field("supabase_service_key", &redact(&self.supabase_service_key))
            .field("anthropic_key", &redact(&self.anthropic_key))
            .field("heygen_key", &redact(&self.heygen_key))
            .field("liveavatar_key", &redact(&self.liveavatar_key))
            .field("app_url", &self.app_url)
            .finish()
    }
}
