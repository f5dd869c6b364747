//! Admission control.
//!
//! A sliding-window log per (subject, resource): a request is admitted only
//! if fewer than `max_requests` requests were admitted for the same pair in
//! the trailing window. Rejected attempts are not recorded.

mod controller;
pub mod lua_scripts;
mod memory_store;
mod redis_store;
mod store;

pub use controller::{rate_window_key, AdmissionController, AdmissionPolicy};
pub use memory_store::InMemoryCounterStore;
pub use redis_store::RedisCounterStore;
pub use store::{CounterStore, StoreError, WindowOp, WindowOutcome};

use thiserror::Error;

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit,
    Reject,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    /// The counter store failed or timed out. Callers fail closed.
    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Invalid admission policy: {0}")]
    InvalidPolicy(String),
}
