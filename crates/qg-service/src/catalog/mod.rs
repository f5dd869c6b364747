//! Resource catalog: the read-only data layer behind the gateway.
//!
//! Resources are discovered once at startup from the [`DataSource`] and
//! frozen into a [`ResourceRegistry`]. The registry is the allow-list: a
//! resource absent from it is never counted, fetched or rate-limited.

mod postgres;
mod record;

pub use postgres::PgDataSource;
pub use record::{RawRecord, Record};

use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Data source error: {0}")]
    Database(String),

    #[error("Data source timed out")]
    Timeout,

    #[error("Invalid record: {0}")]
    InvalidRecord(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Database(err.to_string())
    }
}

/// A queryable resource: its name and ordered field names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    pub name: String,
    pub fields: Vec<String>,
}

impl ResourceDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<String>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    /// Project a raw row onto this descriptor's fields, in order.
    pub fn shape(&self, raw: &RawRecord) -> Record {
        Record::shape(&self.fields, raw)
    }
}

/// Read-only data access consumed by the gateway.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Names of every resource the source can serve.
    async fn list_resources(&self) -> Result<Vec<String>, CatalogError>;

    /// Ordered field names of `resource`.
    async fn fields(&self, resource: &str) -> Result<Vec<String>, CatalogError>;

    /// Total number of records in `resource`.
    async fn count(&self, resource: &ResourceDescriptor) -> Result<u64, CatalogError>;

    /// Up to `limit` records starting at `offset`, in a stable order.
    async fn fetch_page(
        &self,
        resource: &ResourceDescriptor,
        offset: u64,
        limit: u32,
    ) -> Result<Vec<RawRecord>, CatalogError>;

    /// Check that the source is reachable.
    async fn ping(&self) -> Result<(), CatalogError>;
}

/// Fixed set of queryable resources, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct ResourceRegistry {
    /// Descriptors in allow-list order.
    descriptors: Vec<ResourceDescriptor>,
    index: HashMap<String, usize>,
}

impl ResourceRegistry {
    /// Build a registry directly from descriptors. Later duplicates are ignored.
    pub fn from_descriptors(descriptors: Vec<ResourceDescriptor>) -> Self {
        let mut registry = Self::default();
        for descriptor in descriptors {
            if registry.index.contains_key(&descriptor.name) {
                continue;
            }
            registry
                .index
                .insert(descriptor.name.clone(), registry.descriptors.len());
            registry.descriptors.push(descriptor);
        }
        registry
    }

    /// Discover resources: the intersection of the source's resources and
    /// `allowed`, each with its ordered fields.
    ///
    /// Allowed names the source does not have are logged and left out.
    pub async fn discover(
        source: &dyn DataSource,
        allowed: &[String],
    ) -> Result<Self, CatalogError> {
        let available = source.list_resources().await?;

        let mut descriptors = Vec::with_capacity(allowed.len());
        for name in allowed {
            if !available.iter().any(|a| a == name) {
                warn!(
                    target: "qg.catalog",
                    resource = %name,
                    "Allowed resource not found in data source, excluding"
                );
                continue;
            }

            let fields = source.fields(name).await?;
            if fields.is_empty() {
                warn!(
                    target: "qg.catalog",
                    resource = %name,
                    "Allowed resource has no fields, excluding"
                );
                continue;
            }

            descriptors.push(ResourceDescriptor::new(name.clone(), fields));
        }

        let registry = Self::from_descriptors(descriptors);
        info!(
            target: "qg.catalog",
            resources = registry.len(),
            "Resource registry built"
        );
        Ok(registry)
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDescriptor> {
        self.index
            .get(name)
            .and_then(|&position| self.descriptors.get(position))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn descriptors(&self) -> &[ResourceDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
