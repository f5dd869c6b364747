//! In-memory data source for gateway testing.
//!
//! # Example
//!
//! ```rust,ignore
//! use qg_test_utils::MockDataSource;
//!
//! let source = MockDataSource::new()
//!     .with_products(25)
//!     .with_table("users", &["id", "password_hash"], vec![]);
//! ```

use async_trait::async_trait;
use qg_service::catalog::{CatalogError, DataSource, RawRecord, ResourceDescriptor};
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
struct Table {
    name: String,
    fields: Vec<String>,
    rows: Vec<RawRecord>,
}

/// Data source backed by vectors of JSON rows.
#[derive(Debug, Default)]
pub struct MockDataSource {
    tables: Vec<Table>,
    fetches: AtomicUsize,
    failing: AtomicBool,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table. Rows are served in the order given.
    pub fn with_table(mut self, name: &str, fields: &[&str], rows: Vec<RawRecord>) -> Self {
        self.tables.push(Table {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            rows,
        });
        self
    }

    /// Add a `products` table with `count` rows: id 1..=count.
    pub fn with_products(self, count: u32) -> Self {
        let rows = (1..=count)
            .map(|id| {
                json!({
                    "id": id,
                    "title": format!("Product {id}"),
                    "price": f64::from(id) * 1.5,
                    "discontinued": null,
                })
                .as_object()
                .cloned()
                .unwrap_or_default()
            })
            .collect();
        self.with_table("products", &["id", "title", "price", "discontinued"], rows)
    }

    /// Add a `customers` table with `count` rows.
    pub fn with_customers(self, count: u32) -> Self {
        let rows = (1..=count)
            .map(|id| {
                json!({ "id": id, "name": format!("Customer {id}") })
                    .as_object()
                    .cloned()
                    .unwrap_or_default()
            })
            .collect();
        self.with_table("customers", &["id", "name"], rows)
    }

    /// Make every subsequent call fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `count` plus `fetch_page` calls served.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), CatalogError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CatalogError::Database("connection reset".to_string()));
        }
        Ok(())
    }

    fn table(&self, name: &str) -> Result<&Table, CatalogError> {
        self.tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| CatalogError::UnknownResource(name.to_string()))
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    async fn list_resources(&self) -> Result<Vec<String>, CatalogError> {
        self.check()?;
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn fields(&self, resource: &str) -> Result<Vec<String>, CatalogError> {
        self.check()?;
        Ok(self.table(resource)?.fields.clone())
    }

    async fn count(&self, resource: &ResourceDescriptor) -> Result<u64, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.table(&resource.name)?.rows.len() as u64)
    }

    async fn fetch_page(
        &self,
        resource: &ResourceDescriptor,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<RawRecord>, CatalogError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        Ok(self
            .table(&resource.name)?
            .rows
            .iter()
            .skip(offset)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> Result<(), CatalogError> {
        self.check()
    }
}
