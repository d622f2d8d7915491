//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! pipeline / upstream client produce:
//!     → logging.rs (structured log events, request id on every line)
//!     → metrics.rs (request and upstream counters and histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape of metrics_address
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Metric updates are no-ops until an exporter is installed

pub mod logging;
pub mod metrics;
