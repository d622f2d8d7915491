//! Endpoint catalogue.
//!
//! Each endpoint is one [`Endpoint`](crate::proxy::Endpoint) implementation;
//! [`routes`] mounts all of them on the generic pipeline.

pub mod account;
pub mod assistant;
pub mod brokerage;
pub mod economics;
pub mod market;
pub mod payments;
pub mod social;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde_json::json;

use crate::http::AppState;
use crate::proxy::pipeline::{dispatch, dispatch_with_path};

/// Route table. Every route accepts any method so unsupported ones get a
/// JSON 405 from the pipeline rather than axum's empty one.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Market data
        .route("/quote", any(dispatch::<market::Quote>))
        .route("/quote-twelve", any(dispatch::<market::QuoteTwelve>))
        .route("/stock/search", any(dispatch::<market::StockSearch>))
        .route("/stock/{symbol}", any(dispatch_with_path::<market::StockSnapshot>))
        .route("/bars", any(dispatch::<market::Bars>))
        .route("/history", any(dispatch::<market::History>))
        .route("/crypto/latest-price", any(dispatch::<market::CryptoLatestPrice>))
        .route("/crypto/twelve-data-price", any(dispatch::<market::TwelvePrice>))
        // Brokerage
        .route("/positions", any(dispatch::<brokerage::Positions>))
        .route("/orders", any(dispatch::<brokerage::Orders>))
        .route("/trade", any(dispatch::<brokerage::Trade>))
        // Economics and sentiment
        .route("/fred", any(dispatch::<economics::Fred>))
        .route("/economic-calendar", any(dispatch::<economics::EconomicCalendar>))
        .route("/bluesky", any(dispatch::<social::Bluesky>))
        // Payments
        .route("/create-checkout-session", any(dispatch::<payments::CheckoutSession>))
        .route("/create-portal-session", any(dispatch::<payments::PortalSession>))
        // Assistant
        .route("/chat", any(dispatch::<assistant::Chat>))
        .route("/speak", any(dispatch::<assistant::Speak>))
        .route("/liveavatar-token", any(dispatch::<assistant::LiveAvatarToken>))
        .route("/liveavatar-session", any(dispatch::<assistant::LiveAvatarSession>))
        // Account
        .route("/broker-disconnect", any(dispatch::<account::BrokerDisconnect>))
        .route("/health", get(crate::health::health))
        .fallback(not_found)
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
