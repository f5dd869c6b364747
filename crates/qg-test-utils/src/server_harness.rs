//! Test server harness for E2E testing
//!
//! Provides `TestQgServer` for spawning real gateway instances in tests,
//! backed by in-memory counter stores and data sources.

use crate::{test_secret_base64, CountingStore, MockDataSource};
use metrics_exporter_prometheus::PrometheusBuilder;
use qg_service::admission::CounterStore;
use qg_service::catalog::DataSource;
use qg_service::config::Config;
use qg_service::routes::{self, AppState};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Test harness for spawning the Query Gateway in E2E tests.
///
/// # Example
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_health_flow_e2e() -> Result<()> {
///     let server = TestQgServer::spawn().await?;
///     let client = reqwest::Client::new();
///
///     let response = client
///         .get(&format!("{}/health", server.url()))
///         .send()
///         .await?;
///
///     assert_eq!(response.status(), 200);
///     Ok(())
/// }
/// ```
pub struct TestQgServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    _handle: JoinHandle<()>,
}

impl TestQgServer {
    /// Spawn with default settings: 2 requests per 1 s window, page size 10,
    /// `products` (25 rows) and `customers` (3 rows), counting store.
    pub async fn spawn() -> Result<Self, anyhow::Error> {
        let source = MockDataSource::new().with_products(25).with_customers(3);
        Self::spawn_with(HashMap::new(), CountingStore::shared(), Arc::new(source)).await
    }

    /// Spawn with environment overrides and explicit stores.
    ///
    /// The server will:
    /// - Bind to a random available port (127.0.0.1:0)
    /// - Start the HTTP server in the background
    pub async fn spawn_with(
        overrides: HashMap<String, String>,
        store: Arc<dyn CounterStore>,
        source: Arc<dyn DataSource>,
    ) -> Result<Self, anyhow::Error> {
        let config = Self::test_config(overrides)?;

        let state = Arc::new(
            AppState::assemble(config, store, source)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to assemble gateway: {}", e))?,
        );

        // Never installed globally: parallel tests each get their own.
        let metrics_handle = PrometheusBuilder::new().build_recorder().handle();
        let app = routes::build_routes(state.clone(), metrics_handle);

        // Bind to random port
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        // Spawn server in background
        let handle = tokio::spawn(async move {
            let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
            if let Err(e) = axum::serve(listener, make_service).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            state,
            _handle: handle,
        })
    }

    /// Configuration for tests: memory store, shared test secret, issuance on.
    pub fn test_config(overrides: HashMap<String, String>) -> Result<Config, anyhow::Error> {
        let mut vars = HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://test/test".to_string(),
            ),
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("COUNTER_STORE".to_string(), "memory".to_string()),
            ("QG_JWT_SECRET".to_string(), test_secret_base64()),
            ("TOKEN_ISSUANCE_ENABLED".to_string(), "true".to_string()),
        ]);
        vars.extend(overrides);

        Config::from_vars(&vars).map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))
    }

    /// Get the base URL of the test server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Get the socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the assembled application state.
    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Get reference to the server configuration.
    pub fn config(&self) -> &Config {
        &self.state.config
    }
}

impl Drop for TestQgServer {
    fn drop(&mut self) {
        self._handle.abort();
    }
}
