//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!
//! environment
//!     → credentials.rs (API keys, trimmed, aliases resolved)
//!     → Credentials (immutable)
//!
//! both shared via Arc with every request
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Secrets come only from the environment, never from the config file

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;

pub use credentials::Credentials;
pub use loader::{load_config, ConfigError};
pub use schema::{
    AssistantConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    PaymentsConfig, SecurityConfig, TimeoutConfig, UpstreamsConfig,
};
