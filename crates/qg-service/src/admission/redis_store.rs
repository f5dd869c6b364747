//! Redis-backed counter store.
//!
//! # Key Pattern
//!
//! - `rate_limit:{subject_len}:{subject}:{resource}` - sorted set of admitted
//!   request members scored by microsecond timestamp
//!
//! # Connection Pattern
//!
//! The redis-rs `MultiplexedConnection` is cheap to clone and safe to use
//! concurrently, so each operation clones it instead of taking a lock.

use super::lua_scripts;
use super::store::{CounterStore, StoreError, WindowOp, WindowOutcome};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{Client, Script};
use tracing::{error, instrument, warn};

/// Counter store shared by every gateway instance through Redis.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: MultiplexedConnection,
    window_script: Script,
}

impl RedisCounterStore {
    /// Connect to Redis.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Connection` if the URL is invalid or the
    /// connection cannot be established.
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let client = Client::open(redis_url).map_err(|e| {
            // The URL may embed a password; log only the error.
            error!(target: "qg.admission.redis", error = %e, "Failed to open Redis client");
            StoreError::Connection(format!("Failed to open Redis client: {e}"))
        })?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| {
                error!(target: "qg.admission.redis", error = %e, "Failed to connect to Redis");
                StoreError::Connection(format!("Failed to connect to Redis: {e}"))
            })?;

        Ok(Self {
            connection,
            window_script: Script::new(lua_scripts::SLIDING_WINDOW_ADMIT),
        })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    #[instrument(skip_all)]
    async fn record_if_under_limit(&self, op: &WindowOp) -> Result<WindowOutcome, StoreError> {
        let mut conn = self.connection.clone();
        let ttl_ms = u64::try_from(op.key_ttl.as_millis()).unwrap_or(u64::MAX);

        // EVALSHA, falling back to EVAL when the script is not cached.
        let reply: i64 = self
            .window_script
            .key(&op.key)
            .arg(op.now_micros)
            .arg(op.window_start_micros)
            .arg(op.max_requests)
            .arg(ttl_ms)
            .arg(&op.member)
            .invoke_async(&mut conn)
            .await
            .map_err(|e| {
                warn!(target: "qg.admission.redis", error = %e, "Sliding window script failed");
                StoreError::Command(format!("Sliding window script failed: {e}"))
            })?;

        match reply {
            1 => Ok(WindowOutcome::Recorded),
            0 => Ok(WindowOutcome::AtLimit),
            other => {
                warn!(target: "qg.admission.redis", reply = other, "Unexpected script reply");
                Err(StoreError::UnexpectedReply(other))
            }
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connection(format!("Redis PING failed: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    #[test]
    fn test_redis_url_parsing() {
        let valid_urls = [
            "redis://localhost:6379",
            "redis://:password@localhost:6379",
            "redis://redis.example.com:6379/0",
        ];

        for url in &valid_urls {
            assert!(redis::Client::open(*url).is_ok(), "Should parse valid URL: {url}");
        }
    }

    #[test]
    fn test_rejects_non_redis_scheme() {
        assert!(redis::Client::open("http://localhost:6379").is_err());
    }

    #[tokio::test]
    async fn test_connect_failure_does_not_leak_url() {
        // Port 1 is never a Redis server.
        let result = super::RedisCounterStore::connect("redis://:s3cret@127.0.0.1:1").await;

        let message = result.err().map(|e| e.to_string()).unwrap_or_default();
        assert!(!message.is_empty(), "connect to port 1 should fail");
        assert!(!message.contains("s3cret"));
    }

    /// Requires a running Redis; set REDIS_URL and run with `--ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_ping_against_redis() {
        use super::CounterStore;

        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
        let store = super::RedisCounterStore::connect(&url)
            .await
            .expect("Redis should be reachable");

        assert!(store.ping().await.is_ok());
    }
}
