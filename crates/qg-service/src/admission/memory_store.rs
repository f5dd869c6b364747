//! Process-local counter store.
//!
//! Suitable for single-instance deployments and tests. Multiple gateway
//! instances sharing a budget need the Redis store instead.

use super::store::{CounterStore, StoreError, WindowOp, WindowOutcome};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Expired keys are swept once every this many operations.
const SWEEP_INTERVAL: u64 = 256;

#[derive(Debug, Default)]
struct Window {
    /// Admitted timestamps (microseconds), ascending.
    entries: Vec<i64>,
    /// Microsecond timestamp after which the whole key is discarded.
    expires_at: i64,
}

/// In-memory sliding-window store.
///
/// The whole prune/count/insert sequence runs under one mutex, which gives
/// the same per-key atomicity as the Redis script. The lock is never held
/// across an `.await`.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    windows: Mutex<HashMap<String, Window>>,
    operations: AtomicU64,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys, counting only those not yet expired at `now_micros`.
    pub fn live_keys(&self, now_micros: i64) -> Result<usize, StoreError> {
        let windows = self.windows.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(windows.values().filter(|w| w.expires_at > now_micros).count())
    }

    fn apply(&self, op: &WindowOp) -> Result<WindowOutcome, StoreError> {
        let mut windows = self.windows.lock().map_err(|_| StoreError::Poisoned)?;

        if self.operations.fetch_add(1, Ordering::Relaxed) % SWEEP_INTERVAL == 0 {
            windows.retain(|_, w| w.expires_at > op.now_micros);
        }

        let window = windows.entry(op.key.clone()).or_default();
        if window.expires_at <= op.now_micros {
            window.entries.clear();
        }

        window.entries.retain(|&ts| ts > op.window_start_micros);

        // Entries stamped after `now` count too: a request stamped earlier
        // may reach the store after later-stamped ones were recorded.
        if window.entries.len() >= op.max_requests as usize {
            return Ok(WindowOutcome::AtLimit);
        }

        let position = window.entries.partition_point(|&ts| ts <= op.now_micros);
        window.entries.insert(position, op.now_micros);

        let ttl_micros = i64::try_from(op.key_ttl.as_micros()).unwrap_or(i64::MAX);
        window.expires_at = window
            .expires_at
            .max(op.now_micros.saturating_add(ttl_micros));

        Ok(WindowOutcome::Recorded)
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn record_if_under_limit(&self, op: &WindowOp) -> Result<WindowOutcome, StoreError> {
        self.apply(op)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.windows
            .lock()
            .map(|_| ())
            .map_err(|_| StoreError::Poisoned)
    }
}
