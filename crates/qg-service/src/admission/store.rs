//! Counter store abstraction.
//!
//! The store is the only shared mutable state in the gateway. Every
//! mutation goes through [`CounterStore::record_if_under_limit`], which
//! implementations must execute atomically per key.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// One sliding-window admission attempt against a single key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowOp {
    /// Opaque key identifying (subject, resource).
    pub key: String,
    /// Current time, microseconds since the Unix epoch.
    pub now_micros: i64,
    /// `now_micros - window`. Entries at or before this are pruned.
    pub window_start_micros: i64,
    /// Entries allowed strictly after `window_start_micros`.
    pub max_requests: u32,
    /// Expiry applied to the whole key after an admit.
    pub key_ttl: Duration,
    /// Unique member recorded on admit.
    pub member: String,
}

/// Result of one atomic window operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// The window had room; `now` was recorded and the key expiry refreshed.
    Recorded,
    /// The window was full; nothing was recorded.
    AtLimit,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Counter store connection failed: {0}")]
    Connection(String),

    #[error("Counter store command failed: {0}")]
    Command(String),

    #[error("Counter store returned unexpected reply: {0}")]
    UnexpectedReply(i64),

    #[error("Counter store lock poisoned")]
    Poisoned,
}

/// Shared counter store for sliding-window admission.
///
/// Implementations must run prune, count, conditional insert and expiry
/// refresh as one atomic unit per key. Issuing them as separate calls lets
/// two concurrent callers both observe an under-limit count.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Prune entries `<= window_start_micros`, count every remaining entry,
    /// and record `now_micros` only if the count is below `max_requests`.
    ///
    /// Entries stamped after `now_micros` still count: stamps are taken
    /// before the store round trip, so arrival order and stamp order can
    /// differ.
    async fn record_if_under_limit(&self, op: &WindowOp) -> Result<WindowOutcome, StoreError>;

    /// Check that the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}
