//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, route table)
//!     → middleware.rs (JSON bodies for limit/timeout rejections)
//!     → request.rs (request id)
//!     → proxy::pipeline (one handler per endpoint)
//!     → JSON response (+ x-request-id, CORS, Cache-Control)
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
