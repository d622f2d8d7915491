//! Market data and services gateway library.

pub mod config;
pub mod endpoints;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use config::schema::GatewayConfig;
pub use config::Credentials;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
