//! PostgreSQL data source.
//!
//! Resources are the base tables of the connection's current schema.
//! Table and column names are only ever taken from the registry (and so
//! from `information_schema`) and are always quoted before interpolation.

use super::{CatalogError, DataSource, RawRecord, ResourceDescriptor};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::{error, instrument};

/// Statement timeout appended to the connection URL, in seconds.
const STATEMENT_TIMEOUT_SECS: u32 = 5;

#[derive(Clone)]
pub struct PgDataSource {
    pool: PgPool,
}

impl PgDataSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool with a server-side statement timeout.
    pub async fn connect(database_url: &str) -> Result<Self, CatalogError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .connect(&add_statement_timeout(database_url, STATEMENT_TIMEOUT_SECS))
            .await
            .map_err(|e| {
                // The URL carries credentials; log only the error.
                error!(target: "qg.catalog", error = %e, "Failed to connect to database");
                CatalogError::Database(format!("Failed to connect to database: {e}"))
            })?;

        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DataSource for PgDataSource {
    async fn list_resources(&self) -> Result<Vec<String>, CatalogError> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema()
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    async fn fields(&self, resource: &str) -> Result<Vec<String>, CatalogError> {
        let columns = sqlx::query_scalar::<_, String>(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(resource)
        .fetch_all(&self.pool)
        .await?;

        Ok(columns)
    }

    #[instrument(skip_all, fields(resource = %resource.name))]
    async fn count(&self, resource: &ResourceDescriptor) -> Result<u64, CatalogError> {
        let sql = format!("SELECT COUNT(*) FROM {}", quote_identifier(&resource.name));

        let total: i64 = sqlx::query_scalar(&sql).fetch_one(&self.pool).await?;

        u64::try_from(total)
            .map_err(|_| CatalogError::InvalidRecord(format!("negative count {total}")))
    }

    #[instrument(skip_all, fields(resource = %resource.name))]
    async fn fetch_page(
        &self,
        resource: &ResourceDescriptor,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<RawRecord>, CatalogError> {
        let offset = i64::try_from(offset)
            .map_err(|_| CatalogError::InvalidRecord(format!("offset {offset} out of range")))?;

        let sql = page_query(&resource.name);

        let rows: Vec<String> = sqlx::query_scalar(&sql)
            .bind(i64::from(limit))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                serde_json::from_str::<RawRecord>(row)
                    .map_err(|e| CatalogError::InvalidRecord(e.to_string()))
            })
            .collect()
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Quote a Postgres identifier, doubling embedded quotes.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// One page of rows as JSON text, in first-column order.
fn page_query(table: &str) -> String {
    format!(
        "SELECT row_to_json(t)::text FROM (SELECT * FROM {} ORDER BY 1 LIMIT $1 OFFSET $2) t",
        quote_identifier(table)
    )
}

/// Adds statement_timeout to the database URL.
fn add_statement_timeout(url: &str, timeout_secs: u32) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}options=-c%20statement_timeout%3D{}s",
        url, separator, timeout_secs
    )
}
