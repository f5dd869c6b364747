//! HTTP request handlers.

pub mod health;
pub mod metrics;
pub mod query;
pub mod token;

pub use health::{health_check, readiness_check};
pub use metrics::metrics_handler;
pub use query::{list_resources, query_page};
pub use token::issue_token;
