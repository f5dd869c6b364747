//! Query Gateway (QG) Service Library
//!
//! A rate-limited, token-authenticated pagination gateway over a read-only
//! relational store:
//!
//! - Caller authentication with HS256 bearer tokens
//! - Per-(caller, resource) sliding-window admission backed by a shared
//!   counter store (Redis) or an in-process store
//! - Page reads from an allow-listed resource registry
//! - Signed continuation tokens for the next page
//!
//! # Architecture
//!
//! ```text
//! routes/mod.rs -> handlers/*.rs -> gateway.rs -> {token, admission, catalog}
//! ```
//!
//! # Modules
//!
//! - `admission` - Sliding-window admission control and counter stores
//! - `catalog` - Resource registry and data source
//! - `config` - Service configuration from environment
//! - `errors` - Error types with HTTP status code mapping
//! - `gateway` - The per-request pagination flow
//! - `handlers` - HTTP request handlers
//! - `middleware` - Caller extraction and HTTP metrics
//! - `models` - Request/response models
//! - `observability` - Metrics and log-safe hashing
//! - `routes` - Axum router setup
//! - `token` - Token minting and verification

pub mod admission;
pub mod catalog;
pub mod config;
pub mod errors;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod observability;
pub mod routes;
pub mod token;
