use super::store::{CounterStore, WindowOp, WindowOutcome};
use super::{AdmissionError, Decision};
use crate::observability::hash_for_correlation;
use crate::observability::metrics::{record_admission_decision, record_admission_store_latency};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Grace period added to the window for key expiry.
const KEY_TTL_GRACE: Duration = Duration::from_secs(1);

/// Admission budget for one (subject, resource) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdmissionPolicy {
    /// Admitted requests per window. Zero rejects everything.
    pub max_requests: u32,
    /// Sliding window length. Must be non-zero.
    pub window: Duration,
    /// Budget for one store round trip before failing closed.
    pub store_timeout: Duration,
}

/// Sliding-window-log admission control.
///
/// Owns no counter state; every decision is made by a single atomic
/// operation against the shared [`CounterStore`].
#[derive(Clone)]
pub struct AdmissionController {
    store: Arc<dyn CounterStore>,
    max_requests: u32,
    window_micros: i64,
    key_ttl: Duration,
    store_timeout: Duration,
}

impl AdmissionController {
    /// # Errors
    ///
    /// Returns `AdmissionError::InvalidPolicy` if the window is zero or too
    /// large to express in microseconds.
    pub fn new(store: Arc<dyn CounterStore>, policy: AdmissionPolicy) -> Result<Self, AdmissionError> {
        if policy.window.is_zero() {
            return Err(AdmissionError::InvalidPolicy(
                "window must be greater than zero".to_string(),
            ));
        }

        let window_micros = i64::try_from(policy.window.as_micros()).map_err(|_| {
            AdmissionError::InvalidPolicy("window is too large".to_string())
        })?;

        Ok(Self {
            store,
            max_requests: policy.max_requests,
            window_micros,
            key_ttl: policy.window.saturating_add(KEY_TTL_GRACE),
            store_timeout: policy.store_timeout,
        })
    }

    /// Decide whether `subject` may make one more request for `resource` now.
    pub async fn check(&self, subject: &str, resource: &str) -> Result<Decision, AdmissionError> {
        self.check_at(subject, resource, chrono::Utc::now().timestamp_micros())
            .await
    }

    /// Decide at an explicit time, in microseconds since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns `AdmissionError::StoreUnavailable` when the store fails or
    /// does not answer within the store timeout. Callers must treat this
    /// as a rejection.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn check_at(
        &self,
        subject: &str,
        resource: &str,
        now_micros: i64,
    ) -> Result<Decision, AdmissionError> {
        let subject_hash = hash_for_correlation(subject);

        if self.max_requests == 0 {
            debug!(
                target: "qg.admission",
                subject = %subject_hash,
                outcome = "rejected",
                "Admission budget is zero"
            );
            record_admission_decision("reject");
            return Ok(Decision::Reject);
        }

        let op = WindowOp {
            key: rate_window_key(subject, resource),
            now_micros,
            window_start_micros: now_micros.saturating_sub(self.window_micros),
            max_requests: self.max_requests,
            key_ttl: self.key_ttl,
            member: format!("{}-{}", now_micros, Uuid::new_v4()),
        };

        let started = Instant::now();
        let result = tokio::time::timeout(self.store_timeout, self.store.record_if_under_limit(&op))
            .await;
        record_admission_store_latency(started.elapsed());

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                return Err(self.store_unavailable(&subject_hash, e.to_string()));
            }
            Err(_) => {
                return Err(self.store_unavailable(
                    &subject_hash,
                    format!("no reply within {}ms", self.store_timeout.as_millis()),
                ));
            }
        };

        match outcome {
            WindowOutcome::Recorded => {
                debug!(
                    target: "qg.admission",
                    subject = %subject_hash,
                    outcome = "admitted",
                    "Request admitted"
                );
                record_admission_decision("admit");
                Ok(Decision::Admit)
            }
            WindowOutcome::AtLimit => {
                debug!(
                    target: "qg.admission",
                    subject = %subject_hash,
                    outcome = "rejected",
                    "Request rejected, window full"
                );
                record_admission_decision("reject");
                Ok(Decision::Reject)
            }
        }
    }

    /// Check that the backing store is reachable.
    pub async fn ping_store(&self) -> Result<(), AdmissionError> {
        match tokio::time::timeout(self.store_timeout, self.store.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AdmissionError::StoreUnavailable(e.to_string())),
            Err(_) => Err(AdmissionError::StoreUnavailable(
                "ping timed out".to_string(),
            )),
        }
    }

    fn store_unavailable(&self, subject_hash: &str, reason: String) -> AdmissionError {
        warn!(
            target: "qg.admission",
            subject = %subject_hash,
            outcome = "store_unavailable",
            reason = %reason,
            "Counter store unavailable, failing closed"
        );
        record_admission_decision("store_unavailable");
        AdmissionError::StoreUnavailable(reason)
    }
}

/// Store key for a (subject, resource) pair.
///
/// The subject is length-prefixed so that no two distinct pairs map to the
/// same key even when either part contains `:`.
pub fn rate_window_key(subject: &str, resource: &str) -> String {
    format!("rate_limit:{}:{}:{}", subject.len(), subject, resource)
}
