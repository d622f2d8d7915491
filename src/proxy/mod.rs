//! Proxy-endpoint subsystem.
//!
//! # Data Flow
//! ```text
//! validate.rs   (Request Validator)
//!     → upstream.rs  (Upstream Client, one outbound call)
//!     → normalize.rs (shared field-mapping helpers)
//!     → error.rs     (Error Mapper, JSON error bodies)
//! endpoint.rs ties them together as one trait; pipeline.rs runs it.
//! ```
//!
//! # Design Decisions
//! - Stateless: nothing survives a request
//! - At most one upstream call, or two sequential calls to one provider
//! - No retries anywhere; every failure is terminal for the request

pub mod endpoint;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod upstream;
pub mod validate;

pub use endpoint::{CacheHint, Context, Endpoint, Step};
pub use error::{ProxyError, UpstreamFailure};
pub use upstream::{provider_url, Provider, UpstreamClient, UpstreamRequest};
pub use validate::EndpointRequest;
