//! Caller-token issuance.
//!
//! Development entry point: anyone who can reach it can mint a token for
//! any subject, so it is served only when `TOKEN_ISSUANCE_ENABLED=true`.

use crate::errors::QgError;
use crate::models::{IssueTokenRequest, IssueTokenResponse};
use crate::routes::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;
use tracing::instrument;

/// Longest lifetime a caller may request, in seconds (one year).
const MAX_EXPIRES_IN_SECS: u64 = 365 * 24 * 3600;

/// Longest accepted subject, in bytes.
const MAX_SUBJECT_LEN: usize = 256;

/// Handler for POST /api/v1/token
///
/// # Response
///
/// - 200 with `{access_token, token_type, expires_in?}`
/// - 400 malformed body, empty or oversized subject, zero or excessive lifetime
/// - 404 issuance disabled
#[instrument(skip_all, name = "qg.handlers.token")]
pub async fn issue_token(
    State(state): State<Arc<AppState>>,
    request: Result<Json<IssueTokenRequest>, JsonRejection>,
) -> Result<Json<IssueTokenResponse>, QgError> {
    if !state.config.token_issuance_enabled {
        return Err(QgError::NotFound("Not found".to_string()));
    }

    let Json(request) = request.map_err(|rejection| QgError::BadRequest(rejection.body_text()))?;

    let subject = request.subject.trim();
    if subject.is_empty() {
        return Err(QgError::BadRequest("subject must not be empty".to_string()));
    }
    if subject.len() > MAX_SUBJECT_LEN {
        return Err(QgError::BadRequest(format!(
            "subject must be at most {} bytes",
            MAX_SUBJECT_LEN
        )));
    }

    let tokens = state.gateway.tokens();
    let now = chrono::Utc::now().timestamp();
    let mut claims = tokens.caller_claims(subject);

    if let Some(expires_in) = request.expires_in {
        if expires_in == 0 || expires_in > MAX_EXPIRES_IN_SECS {
            return Err(QgError::BadRequest(format!(
                "expires_in must be between 1 and {}",
                MAX_EXPIRES_IN_SECS
            )));
        }
        let lifetime = i64::try_from(expires_in).unwrap_or(i64::MAX);
        claims = claims.with_expiry(now.saturating_add(lifetime));
    }

    let access_token = tokens.mint_at(&claims, now)?;

    tracing::info!(
        target: "qg.token",
        subject = %crate::observability::hash_for_correlation(subject),
        expiring = request.expires_in.is_some(),
        "Caller token issued"
    );

    Ok(Json(IssueTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: request.expires_in,
    }))
}
