//! Bearer token extraction and the caller-authentication middleware.

use crate::errors::QgError;
use crate::routes::AppState;
use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::instrument;

/// Extract the Bearer token from the Authorization header.
///
/// A missing header, a non-UTF-8 value, a scheme other than `Bearer` and an
/// empty token all count as "no token".
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let Some(value) = headers.get("authorization").and_then(|h| h.to_str().ok()) else {
        tracing::debug!(target: "qg.middleware.auth", "Missing Authorization header");
        return None;
    };

    match value.strip_prefix("Bearer ").map(str::trim) {
        Some(token) if !token.is_empty() => Some(token),
        _ => {
            tracing::debug!(target: "qg.middleware.auth", "Invalid Authorization header format");
            None
        }
    }
}

/// Authentication middleware for routes that need a caller but no
/// admission check.
///
/// # Response
///
/// - Returns 401 Unauthorized if the token is missing, invalid or has no subject
/// - Continues with the `Caller` in request extensions otherwise
#[instrument(skip_all, name = "qg.middleware.auth")]
pub async fn require_caller(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<impl IntoResponse, QgError> {
    let caller = state
        .gateway
        .authenticate(extract_bearer_token(req.headers()))?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            HeaderValue::from_str(value).expect("valid header value"),
        );
        headers
    }

    #[test]
    fn test_extracts_bearer_token() {
        let headers = headers("Bearer abc.def.ghi");
        assert_eq!(extract_bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wrong_scheme() {
        assert_eq!(extract_bearer_token(&headers("Basic dXNlcjpwYXNz")), None);
        assert_eq!(extract_bearer_token(&headers("bearer abc.def.ghi")), None);
    }

    #[test]
    fn test_empty_token() {
        assert_eq!(extract_bearer_token(&headers("Bearer ")), None);
        assert_eq!(extract_bearer_token(&headers("Bearer    ")), None);
    }
}
