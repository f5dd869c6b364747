//! Pagination gateway: the per-request orchestration point.
//!
//! Every request walks the same path, and the order is load-bearing:
//!
//! 1. Bearer token present, else `MissingToken`
//! 2. Token verifies and names a subject, else `InvalidToken`/`TokenExpired`/...
//! 3. Resource is in the registry, else `ResourceDenied`
//! 4. Admission controller admits, else `RateLimited` (or `StoreUnavailable`)
//! 5. Page fetched from the data source, else `FetchFailed`
//! 6. Continuation token minted for the next page
//!
//! A denied resource never reaches the counter store or the data source.
//!
//! Continuation tokens are re-checked in full on every page: signature,
//! time window, subject, resource allow-list and admission. A continuation
//! token grants its subject the next page of any allowed resource, exactly
//! as the caller token did.

use crate::admission::{AdmissionController, Decision};
use crate::catalog::{
    CatalogError, DataSource, RawRecord, Record, ResourceDescriptor, ResourceRegistry,
};
use crate::errors::QgError;
use crate::observability::hash_for_correlation;
use crate::observability::metrics::record_page_fetch;
use crate::token::{ClaimSet, TokenError, TokenService};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Body of a page query.
#[derive(Debug, Clone, Deserialize)]
pub struct PageRequest {
    pub resource: String,
    /// Requested page. Ignored when the token carries a page.
    #[serde(default)]
    pub page: Option<u32>,
}

/// One served page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub resource: String,
    pub records: Vec<Record>,
    pub total: u64,
    pub page: u32,
    pub continuation_token: String,
}

/// A verified caller.
#[derive(Debug, Clone)]
pub struct Caller {
    pub subject: String,
    pub claims: ClaimSet,
}

pub struct PaginationGateway {
    tokens: Arc<TokenService>,
    admission: AdmissionController,
    registry: Arc<ResourceRegistry>,
    source: Arc<dyn DataSource>,
    page_size: u32,
    fetch_timeout: Duration,
}

impl PaginationGateway {
    pub fn new(
        tokens: Arc<TokenService>,
        admission: AdmissionController,
        registry: Arc<ResourceRegistry>,
        source: Arc<dyn DataSource>,
        page_size: u32,
        fetch_timeout: Duration,
    ) -> Self {
        Self {
            tokens,
            admission,
            registry,
            source,
            page_size,
            fetch_timeout,
        }
    }

    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Check that the counter store answers within the store timeout.
    pub async fn ping_store(&self) -> Result<(), QgError> {
        self.admission.ping_store().await.map_err(QgError::from)
    }

    /// Check that the data source answers within the fetch timeout.
    pub async fn ping_source(&self) -> Result<(), QgError> {
        match tokio::time::timeout(self.fetch_timeout, self.source.ping()).await {
            Ok(result) => result.map_err(QgError::from),
            Err(_) => Err(CatalogError::Timeout.into()),
        }
    }

    /// Verify a bearer token and require a subject.
    pub fn authenticate(&self, bearer: Option<&str>) -> Result<Caller, QgError> {
        let token = bearer.ok_or(QgError::MissingToken)?;

        let claims = self.tokens.verify(token)?;

        // The service accepts subject-less claim sets; the gateway does not.
        let subject = claims
            .subject()
            .map(str::to_string)
            .ok_or_else(|| QgError::from(TokenError::MissingClaim("sub".to_string())))?;

        Ok(Caller { subject, claims })
    }

    /// Serve one page.
    #[instrument(skip_all, fields(resource = %request.resource))]
    pub async fn serve(&self, bearer: Option<&str>, request: &PageRequest) -> Result<Page, QgError> {
        let caller = self.authenticate(bearer)?;
        let subject_hash = hash_for_correlation(&caller.subject);

        let descriptor = self.registry.get(&request.resource).ok_or_else(|| {
            debug!(
                target: "qg.gateway",
                subject = %subject_hash,
                "Resource not in registry"
            );
            QgError::ResourceDenied(request.resource.clone())
        })?;

        let page = caller.claims.page.or(request.page).unwrap_or(1);
        let (offset, next_page) = page_bounds(page, self.page_size)?;

        match self.admission.check(&caller.subject, &descriptor.name).await? {
            Decision::Admit => {}
            Decision::Reject => return Err(QgError::RateLimited),
        }

        let (total, raw_records) = self.fetch(descriptor, offset).await?;
        let records: Vec<Record> = raw_records.iter().map(|raw| descriptor.shape(raw)).collect();

        let continuation_token = self
            .tokens
            .mint(&self.tokens.continuation_claims(
                &caller.subject,
                next_page,
                caller.claims.exp,
            ))?;

        info!(
            target: "qg.gateway",
            subject = %subject_hash,
            page,
            records = records.len(),
            total,
            "Page served"
        );

        Ok(Page {
            resource: descriptor.name.clone(),
            records,
            total,
            page,
            continuation_token,
        })
    }

    async fn fetch(
        &self,
        descriptor: &ResourceDescriptor,
        offset: u64,
    ) -> Result<(u64, Vec<RawRecord>), QgError> {
        let started = Instant::now();

        let work = async {
            let total = self.source.count(descriptor).await?;
            let rows = self
                .source
                .fetch_page(descriptor, offset, self.page_size)
                .await?;
            Ok::<_, CatalogError>((total, rows))
        };

        match tokio::time::timeout(self.fetch_timeout, work).await {
            Ok(Ok(result)) => {
                record_page_fetch("success", started.elapsed());
                Ok(result)
            }
            Ok(Err(e)) => {
                record_page_fetch("error", started.elapsed());
                Err(e.into())
            }
            Err(_) => {
                record_page_fetch("timeout", started.elapsed());
                Err(CatalogError::Timeout.into())
            }
        }
    }
}

/// Offset of `page` and the page after it.
fn page_bounds(page: u32, page_size: u32) -> Result<(u64, u32), QgError> {
    if page == 0 {
        return Err(QgError::BadRequest("page must be at least 1".to_string()));
    }

    let offset = u64::from(page - 1)
        .checked_mul(u64::from(page_size))
        .ok_or_else(|| QgError::BadRequest("page is out of range".to_string()))?;

    let next_page = page
        .checked_add(1)
        .ok_or_else(|| QgError::BadRequest("page is out of range".to_string()))?;

    Ok((offset, next_page))
}
