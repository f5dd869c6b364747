//! Instrumented counter stores for admission testing.
//!
//! - `CountingStore` - real sliding-window semantics, counts every call
//! - `FailingStore` - every call errors (store outage)
//! - `SlowStore` - sleeps before answering (store latency / timeout)

use async_trait::async_trait;
use qg_service::admission::{
    CounterStore, InMemoryCounterStore, StoreError, WindowOp, WindowOutcome,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-process store that records how often it was consulted.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: InMemoryCounterStore,
    calls: AtomicUsize,
    admitted: AtomicUsize,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for wiring into `AppState::assemble`.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Number of `record_if_under_limit` calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls that recorded an entry.
    pub fn admitted(&self) -> usize {
        self.admitted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterStore for CountingStore {
    async fn record_if_under_limit(&self, op: &WindowOp) -> Result<WindowOutcome, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.inner.record_if_under_limit(op).await?;
        if outcome == WindowOutcome::Recorded {
            self.admitted.fetch_add(1, Ordering::SeqCst);
        }
        Ok(outcome)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }
}

/// Store whose every operation fails with a connection error.
#[derive(Debug, Default)]
pub struct FailingStore {
    calls: AtomicUsize,
}

impl FailingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CounterStore for FailingStore {
    async fn record_if_under_limit(&self, _op: &WindowOp) -> Result<WindowOutcome, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::Connection("connection refused".to_string()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Connection("connection refused".to_string()))
    }
}

/// Store that answers correctly after `delay`.
#[derive(Debug)]
pub struct SlowStore {
    inner: InMemoryCounterStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryCounterStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl CounterStore for SlowStore {
    async fn record_if_under_limit(&self, op: &WindowOp) -> Result<WindowOutcome, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.record_if_under_limit(op).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.ping().await
    }
}
