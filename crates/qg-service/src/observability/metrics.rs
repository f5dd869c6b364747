//! Metrics definitions for the Query Gateway.
//!
//! All metrics follow Prometheus naming conventions:
//! - `qg_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `method`: HTTP methods
//! - `endpoint`: the fixed route table, anything else is `/other`
//! - `operation`: `mint`, `verify`
//! - `decision`: `admit`, `reject`, `store_unavailable`
//! - `status`: `success`, `error`, `timeout`
//!
//! Resource names and subjects are never used as labels.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize the Prometheus recorder and return the handle used by
/// `GET /metrics`.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Prefix("qg_http_request".to_string()),
            &[
                0.005, 0.010, 0.025, 0.050, 0.100, 0.150, 0.200, 0.300, 0.500, 1.000, 2.000,
            ],
        )
        .map_err(|e| format!("Failed to set HTTP request buckets: {e}"))?
        // Store round trips sit far below the HTTP budget; the default store
        // timeout is 250ms.
        .set_buckets_for_metric(
            Matcher::Prefix("qg_admission_store".to_string()),
            &[
                0.0005, 0.001, 0.002, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250,
            ],
        )
        .map_err(|e| format!("Failed to set admission store buckets: {e}"))?
        .set_buckets_for_metric(
            Matcher::Prefix("qg_page_fetch".to_string()),
            &[
                0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.000, 2.500, 5.000,
            ],
        )
        .map_err(|e| format!("Failed to set page fetch buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

// ============================================================================
// HTTP Request Metrics
// ============================================================================

/// Record HTTP request completion
///
/// Metric: `qg_http_requests_total`, `qg_http_request_duration_seconds`
/// Labels: `method`, `endpoint`, `status`
///
/// Captures every response, including framework-level rejections such as
/// 415 and 422 from the JSON extractor.
pub fn record_http_request(method: &str, endpoint: &str, status_code: u16, duration: Duration) {
    let normalized_endpoint = normalize_endpoint(endpoint);
    let status = categorize_status_code(status_code);

    histogram!("qg_http_request_duration_seconds",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());

    counter!("qg_http_requests_total",
        "method" => method.to_string(),
        "endpoint" => normalized_endpoint.to_string(),
        "status_code" => status_code.to_string()
    )
    .increment(1);
}

fn categorize_status_code(status_code: u16) -> &'static str {
    match status_code {
        200..=299 => "success",
        408 | 504 => "timeout",
        _ => "error",
    }
}

fn normalize_endpoint(path: &str) -> &'static str {
    match path {
        "/" => "/",
        "/health" => "/health",
        "/ready" => "/ready",
        "/metrics" => "/metrics",
        "/api/v1/token" => "/api/v1/token",
        "/api/v1/query" => "/api/v1/query",
        "/api/v1/resources" => "/api/v1/resources",
        _ => "/other",
    }
}

// ============================================================================
// Token Metrics
// ============================================================================

/// Record a token mint or verify outcome.
///
/// Metric: `qg_token_operations_total`
/// Labels: `operation` (`mint`, `verify`), `status` (`success` or an error kind)
pub fn record_token_operation(operation: &'static str, status: &'static str) {
    counter!("qg_token_operations_total",
        "operation" => operation,
        "status" => status
    )
    .increment(1);
}

// ============================================================================
// Admission Metrics
// ============================================================================

/// Record an admission decision.
///
/// Metric: `qg_admission_decisions_total`
/// Labels: `decision` (`admit`, `reject`, `store_unavailable`)
pub fn record_admission_decision(decision: &'static str) {
    counter!("qg_admission_decisions_total", "decision" => decision).increment(1);
}

/// Record the latency of one atomic counter-store round trip.
///
/// Metric: `qg_admission_store_duration_seconds`
pub fn record_admission_store_latency(duration: Duration) {
    histogram!("qg_admission_store_duration_seconds").record(duration.as_secs_f64());
}

// ============================================================================
// Data Access Metrics
// ============================================================================

/// Record a page fetch (count plus rows) against the data source.
///
/// Metric: `qg_page_fetch_duration_seconds`
/// Labels: `status` (`success`, `error`, `timeout`)
pub fn record_page_fetch(status: &'static str, duration: Duration) {
    histogram!("qg_page_fetch_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
}
