//! Health check handlers.
//!
//! - `/health`: liveness, returns OK while the process runs
//! - `/ready`: readiness, pings the counter store and the data source

use crate::models::ReadinessResponse;
use crate::routes::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use std::sync::Arc;

/// Liveness probe handler. Checks no dependencies.
pub async fn health_check() -> &'static str {
    "OK"
}

/// Readiness probe handler.
///
/// Returns 200 when both the counter store and the data source answer,
/// 503 otherwise. A gateway that cannot reach its counter store would
/// reject every request, so it should not receive traffic.
///
/// Error messages are generic; causes are logged server-side.
#[tracing::instrument(skip_all, name = "qg.health.readiness")]
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    if let Err(e) = state.gateway.ping_store().await {
        tracing::warn!(target: "qg.health", error = %e, "Readiness check failed: counter store");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(not_ready(Some("unhealthy"), None)),
        );
    }

    if let Err(e) = state.gateway.ping_source().await {
        tracing::warn!(target: "qg.health", error = %e, "Readiness check failed: data source");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(not_ready(Some("healthy"), Some("unhealthy"))),
        );
    }

    (
        StatusCode::OK,
        Json(ReadinessResponse {
            status: "ready".to_string(),
            counter_store: Some("healthy".to_string()),
            data_source: Some("healthy".to_string()),
            error: None,
        }),
    )
}

fn not_ready(counter_store: Option<&str>, data_source: Option<&str>) -> ReadinessResponse {
    ReadinessResponse {
        status: "not_ready".to_string(),
        counter_store: counter_store.map(str::to_string),
        data_source: data_source.map(str::to_string),
        error: Some("Service dependencies unavailable".to_string()),
    }
}
