//! Query Gateway
//!
//! Serves paginated reads of allow-listed resources to authenticated,
//! rate-limited callers.

use qg_service::admission::{CounterStore, InMemoryCounterStore, RedisCounterStore};
use qg_service::catalog::{DataSource, PgDataSource};
use qg_service::config::{Config, CounterStoreKind};
use qg_service::errors::StartupError;
use qg_service::observability::metrics::init_metrics_recorder;
use qg_service::routes::{self, AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "qg_service=debug,query_gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Query Gateway");

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        StartupError::from(e)
    })?;

    info!(
        bind_address = %config.bind_address,
        counter_store = ?config.counter_store,
        rate_limit_max_requests = config.rate_limit_max_requests,
        rate_limit_window_seconds = config.rate_limit_window_seconds,
        page_size = config.page_size,
        allowed_resources = ?config.allowed_resources,
        token_issuance_enabled = config.token_issuance_enabled,
        "Configuration loaded successfully"
    );

    if config.token_issuance_enabled {
        warn!("Token issuance endpoint is enabled; do not expose it publicly");
    }

    // Install the Prometheus recorder before any metric is recorded
    let metrics_handle = init_metrics_recorder().map_err(|e| {
        error!("Failed to initialize metrics recorder: {}", e);
        StartupError::Metrics(e)
    })?;

    let store = connect_counter_store(&config).await?;

    info!("Connecting to database...");
    let source: Arc<dyn DataSource> = Arc::new(
        PgDataSource::connect(&config.database_url)
            .await
            .map_err(StartupError::from)?,
    );
    info!("Database connection established");

    // Parse bind address before moving config
    let addr: SocketAddr = config.bind_address.parse().map_err(|e| {
        error!("Invalid bind address: {}", e);
        e
    })?;

    let state = Arc::new(AppState::assemble(config, store, source).await.map_err(|e| {
        error!("Failed to build gateway: {}", e);
        e
    })?);

    let app = routes::build_routes(state, metrics_handle);

    info!("Query Gateway listening on {}", addr);

    // Start server with graceful shutdown support
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Query Gateway shutdown complete");

    Ok(())
}

async fn connect_counter_store(config: &Config) -> Result<Arc<dyn CounterStore>, StartupError> {
    match (&config.counter_store, &config.redis_url) {
        (CounterStoreKind::Redis, Some(url)) => {
            info!("Connecting to Redis counter store...");
            let store = RedisCounterStore::connect(url).await?;
            info!("Redis connection established");
            Ok(Arc::new(store))
        }
        (CounterStoreKind::Redis, None) => Err(StartupError::Config(
            qg_service::config::ConfigError::MissingEnvVar("REDIS_URL".to_string()),
        )),
        (CounterStoreKind::Memory, _) => {
            warn!("Using in-process counter store; limits are not shared across instances");
            Ok(Arc::new(InMemoryCounterStore::new()))
        }
    }
}

/// Listens for shutdown signals (SIGTERM, SIGINT).
/// Returns when a shutdown signal is received and drain period is complete.
async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received SIGINT, starting graceful shutdown..."),
            Err(e) => error!("Failed to listen for SIGINT: {}", e),
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received SIGTERM, starting graceful shutdown...");
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    let drain_secs: u64 = std::env::var("QG_DRAIN_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(30);

    if drain_secs > 0 {
        warn!("Draining connections for {} seconds...", drain_secs);
        tokio::time::sleep(Duration::from_secs(drain_secs)).await;
        info!("Drain period complete");
    } else {
        info!("Skipping drain period (QG_DRAIN_SECONDS=0)");
    }
}
