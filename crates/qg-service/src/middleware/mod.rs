//! HTTP middleware.
//!
//! - `auth` - Bearer extraction and caller authentication
//! - `http_metrics` - Request metrics for every response

pub mod auth;
pub mod http_metrics;

pub use auth::{extract_bearer_token, require_caller};
pub use http_metrics::http_metrics_middleware;
