//! Admission under concurrency.
//!
//! N simultaneous requests for one (subject, resource) pair with budget
//! max < N must admit exactly max of them, whichever store backs the
//! controller.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use futures::future::join_all;
use qg_service::admission::{CounterStore, RedisCounterStore};
use qg_service::errors::QgError;
use qg_service::gateway::PageRequest;
use qg_service::routes::AppState;
use qg_test_utils::{CountingStore, MockDataSource, SlowStore, TestQgServer, TestTokenBuilder};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const MAX_REQUESTS: usize = 5;
const CONCURRENT: usize = 40;

async fn assemble(store: Arc<dyn CounterStore>) -> Result<Arc<AppState>> {
    let config = TestQgServer::test_config(HashMap::from([
        ("RATE_LIMIT_MAX_REQUESTS".to_string(), MAX_REQUESTS.to_string()),
        ("RATE_LIMIT_WINDOW_SECONDS".to_string(), "60".to_string()),
    ]))?;
    let source = Arc::new(MockDataSource::new().with_products(25));
    Ok(Arc::new(
        AppState::assemble(config, store, source)
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?,
    ))
}

/// Fire `CONCURRENT` requests at once; return (admitted, rate limited).
///
/// Any other outcome fails the test.
async fn burst(state: Arc<AppState>, subject: &str) -> (usize, usize) {
    let token = TestTokenBuilder::new().for_subject(subject).build();

    let tasks = (0..CONCURRENT).map(|_| {
        let state = state.clone();
        let token = token.clone();
        tokio::spawn(async move {
            let request = PageRequest {
                resource: "products".to_string(),
                page: None,
            };
            state.gateway.serve(Some(&token), &request).await
        })
    });

    let mut admitted = 0;
    let mut limited = 0;
    let mut unexpected = Vec::new();
    for result in join_all(tasks).await {
        match result.unwrap() {
            Ok(_) => admitted += 1,
            Err(QgError::RateLimited) => limited += 1,
            Err(other) => unexpected.push(other.to_string()),
        }
    }
    assert!(unexpected.is_empty(), "unexpected errors: {unexpected:?}");
    (admitted, limited)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_burst_admits_exactly_max() -> Result<()> {
    let store = CountingStore::shared();
    let state = assemble(store.clone()).await?;

    let (admitted, limited) = burst(state, "burst-user").await;

    assert_eq!(admitted, MAX_REQUESTS);
    assert_eq!(limited, CONCURRENT - MAX_REQUESTS);
    assert_eq!(store.calls(), CONCURRENT);
    assert_eq!(store.admitted(), MAX_REQUESTS);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_burst_with_store_latency() -> Result<()> {
    // Interleaves the awaits of every request without exceeding the
    // default store timeout.
    let state = assemble(Arc::new(SlowStore::new(Duration::from_millis(20)))).await?;

    let (admitted, limited) = burst(state, "slow-user").await;

    assert_eq!(admitted, MAX_REQUESTS);
    assert_eq!(limited, CONCURRENT - MAX_REQUESTS);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_bursts_are_isolated_per_subject() -> Result<()> {
    let state = assemble(CountingStore::shared()).await?;

    let (first, second) = tokio::join!(burst(state.clone(), "alice"), burst(state, "bob"));

    assert_eq!(first.0, MAX_REQUESTS);
    assert_eq!(second.0, MAX_REQUESTS);

    Ok(())
}

/// Requires a running Redis; set REDIS_URL and run with `--ignored`.
#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
#[ignore]
async fn test_concurrent_burst_against_redis() -> Result<()> {
    let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let store = Arc::new(RedisCounterStore::connect(&url).await?);
    let state = assemble(store).await?;

    // Fresh subject per run so earlier runs' windows do not interfere.
    let subject = format!("redis-burst-{}", uuid::Uuid::new_v4());
    let (admitted, limited) = burst(state, &subject).await;

    assert_eq!(admitted, MAX_REQUESTS);
    assert_eq!(limited, CONCURRENT - MAX_REQUESTS);

    Ok(())
}
