//! HTTP routes for the Query Gateway.
//!
//! Defines the Axum router and application state.

use crate::admission::{AdmissionController, AdmissionPolicy, CounterStore};
use crate::catalog::{DataSource, ResourceRegistry};
use crate::config::Config;
use crate::errors::StartupError;
use crate::gateway::PaginationGateway;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, require_caller};
use crate::token::TokenService;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Whole-request timeout applied to every route.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: Config,

    /// Token verification, admission, registry and data access.
    pub gateway: Arc<PaginationGateway>,
}

impl AppState {
    /// Wire the gateway from configuration and its two external stores.
    ///
    /// Discovers the resource registry from `source` once; the registry is
    /// fixed for the life of the process.
    pub async fn assemble(
        config: Config,
        store: Arc<dyn CounterStore>,
        source: Arc<dyn DataSource>,
    ) -> Result<Self, StartupError> {
        let tokens = Arc::new(TokenService::new(
            &config.jwt_secret,
            config.token_issuer.clone(),
            config.token_audience.clone(),
            config.jwt_clock_skew(),
        ));

        let admission = AdmissionController::new(
            store,
            AdmissionPolicy {
                max_requests: config.rate_limit_max_requests,
                window: config.rate_limit_window(),
                store_timeout: config.store_timeout(),
            },
        )?;

        let registry =
            Arc::new(ResourceRegistry::discover(source.as_ref(), &config.allowed_resources).await?);

        if registry.is_empty() {
            tracing::warn!(
                target: "qg.catalog",
                "No allowed resource exists in the data source; every query will be denied"
            );
        }

        let gateway = Arc::new(PaginationGateway::new(
            tokens,
            admission,
            registry,
            source,
            config.page_size,
            config.fetch_timeout(),
        ));

        Ok(Self { config, gateway })
    }
}

/// Build the application routes.
///
/// - `/health` - Liveness probe - public
/// - `/ready` - Readiness probe (counter store + data source) - public
/// - `/metrics` - Prometheus metrics - public
/// - `POST /api/v1/token` - Caller token issuance (404 unless enabled)
/// - `POST /api/v1/query` - Page query (bearer authenticated by the gateway)
/// - `GET /api/v1/resources` - Registry listing (caller required, no admission)
/// - TraceLayer, 30 second request timeout, HTTP metrics (outermost)
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/api/v1/token", post(handlers::issue_token))
        .route("/api/v1/query", post(handlers::query_page))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let protected_routes = Router::new()
        .route("/api/v1/resources", get(handlers::list_resources))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_caller))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees every response)
    public_routes
        .merge(metrics_routes)
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(middleware::from_fn(http_metrics_middleware))
}
