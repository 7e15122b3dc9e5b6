//! # Middleware Stack
//!
//! - [`metrics`]: Prometheus request metrics.
//! - [`rate_limit`]: per-caller rate limiting.
//! - [`error_path`]: stamps the request path into error bodies.
//!
//! Authentication lives in [`crate::auth`]; request tracing is tower-http's
//! `TraceLayer`, applied in [`crate::app`].

pub mod error_path;
pub mod metrics;
pub mod rate_limit;
