//! Page query and resource listing handlers.

use crate::errors::QgError;
use crate::gateway::{Caller, Page, PageRequest};
use crate::middleware::extract_bearer_token;
use crate::models::{ResourceListResponse, ResourceSummary};
use crate::routes::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::{Extension, Json};
use std::sync::Arc;
use tracing::instrument;

/// Handler for POST /api/v1/query
///
/// Authenticates the bearer (caller or continuation token), checks the
/// resource against the registry, consults admission control and serves
/// one page together with the continuation token for the next one.
///
/// # Response
///
/// - 200 with `{resource, records, total, page, continuationToken}`
/// - 400 body is not a valid page request (only after the bearer verifies)
/// - 401 missing/invalid/expired token
/// - 403 resource not available
/// - 429 `RATE_LIMIT_EXCEEDED`
/// - 502 data source failure
#[instrument(skip_all, name = "qg.handlers.query")]
pub async fn query_page(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Result<Json<PageRequest>, JsonRejection>,
) -> Result<Json<Page>, QgError> {
    let bearer = extract_bearer_token(&headers);

    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            // An unauthenticated caller learns nothing about the body.
            state.gateway.authenticate(bearer)?;
            return Err(QgError::BadRequest(rejection.body_text()));
        }
    };

    let page = state
        .gateway
        .serve(bearer, &request)
        .await?;

    Ok(Json(page))
}

/// Handler for GET /api/v1/resources
///
/// Lists the registry. Requires a caller (see `require_caller`) but does
/// not consume admission budget.
#[instrument(skip_all, name = "qg.handlers.resources")]
pub async fn list_resources(
    State(state): State<Arc<AppState>>,
    Extension(_caller): Extension<Caller>,
) -> Json<ResourceListResponse> {
    let resources = state
        .gateway
        .registry()
        .descriptors()
        .iter()
        .map(|d| ResourceSummary {
            name: d.name.clone(),
            fields: d.fields.clone(),
        })
        .collect();

    Json(ResourceListResponse {
        resources,
        page_size: state.config.page_size,
    })
}
