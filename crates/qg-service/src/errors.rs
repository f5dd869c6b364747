//! Query Gateway error types.
//!
//! All errors map to HTTP status codes via the `IntoResponse` impl. Messages
//! returned to clients are generic; underlying causes are logged server-side.
//!
//! `StoreUnavailable` is answered exactly like `RateLimited` so the caller
//! sees a fail-closed rejection. The two are told apart only in logs and
//! metrics.

use crate::admission::AdmissionError;
use crate::catalog::CatalogError;
use crate::token::TokenError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Value of the `WWW-Authenticate` header on 401 responses.
pub const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"query-gateway\"";

/// Message used for both over-budget and fail-closed rejections.
pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Please try again later.";

/// Query Gateway error type.
///
/// Maps to HTTP status codes:
/// - MissingToken, InvalidToken, TokenExpired, TokenNotYetValid: 401
/// - ResourceDenied: 403
/// - RateLimited, StoreUnavailable: 429
/// - FetchFailed: 502
/// - BadRequest: 400
/// - NotFound: 404
/// - Internal: 500
#[derive(Debug, Error)]
pub enum QgError {
    #[error("Missing bearer token")]
    MissingToken,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Resource denied: {0}")]
    ResourceDenied(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Counter store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Fetch failed: {0}")]
    FetchFailed(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QgError {
    /// Returns the HTTP status code for this error (for metrics recording).
    pub fn status_code(&self) -> u16 {
        match self {
            QgError::MissingToken
            | QgError::InvalidToken(_)
            | QgError::TokenExpired
            | QgError::TokenNotYetValid => 401,
            QgError::ResourceDenied(_) => 403,
            QgError::RateLimited | QgError::StoreUnavailable(_) => 429,
            QgError::FetchFailed(_) => 502,
            QgError::BadRequest(_) => 400,
            QgError::NotFound(_) => 404,
            QgError::Internal(_) => 500,
        }
    }

    /// Stable machine-readable code placed in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            QgError::MissingToken => "MISSING_TOKEN",
            QgError::InvalidToken(_) => "INVALID_TOKEN",
            QgError::TokenExpired => "TOKEN_EXPIRED",
            QgError::TokenNotYetValid => "TOKEN_NOT_YET_VALID",
            QgError::ResourceDenied(_) => "RESOURCE_DENIED",
            QgError::RateLimited | QgError::StoreUnavailable(_) => "RATE_LIMIT_EXCEEDED",
            QgError::FetchFailed(_) => "FETCH_FAILED",
            QgError::BadRequest(_) => "BAD_REQUEST",
            QgError::NotFound(_) => "NOT_FOUND",
            QgError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for QgError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let message = match &self {
            QgError::MissingToken => "Missing or malformed Authorization header".to_string(),
            QgError::InvalidToken(reason) => reason.clone(),
            QgError::TokenExpired => "The access token has expired".to_string(),
            QgError::TokenNotYetValid => "The access token is not yet valid".to_string(),
            QgError::ResourceDenied(resource) => {
                format!("Resource '{}' is not available", resource)
            }
            // Already logged by the admission controller with
            // outcome = "store_unavailable".
            QgError::RateLimited | QgError::StoreUnavailable(_) => RATE_LIMITED_MESSAGE.to_string(),
            QgError::FetchFailed(reason) => {
                tracing::error!(target: "qg.catalog", reason = %reason, "Page fetch failed");
                "The upstream data source failed to serve the page".to_string()
            }
            QgError::BadRequest(reason) => reason.clone(),
            QgError::NotFound(what) => what.clone(),
            QgError::Internal(reason) => {
                tracing::error!(target: "qg.internal", reason = %reason, "Internal error");
                "An internal error occurred".to_string()
            }
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: self.code().to_string(),
                message,
            },
        };

        let mut response = (status, Json(error_response)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(header_value) = WWW_AUTHENTICATE_VALUE.parse() {
                response
                    .headers_mut()
                    .insert("WWW-Authenticate", header_value);
            }
        }

        response
    }
}

/// Failures while assembling the service at startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("Admission setup failed: {0}")]
    Admission(#[from] AdmissionError),

    #[error("Counter store setup failed: {0}")]
    Store(#[from] crate::admission::StoreError),

    #[error("Resource discovery failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Metrics setup failed: {0}")]
    Metrics(String),
}

impl From<TokenError> for QgError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => QgError::TokenExpired,
            TokenError::NotYetValid => QgError::TokenNotYetValid,
            TokenError::Signing(reason) => QgError::Internal(reason),
            TokenError::Malformed(_)
            | TokenError::InvalidSignature
            | TokenError::MissingClaim(_) => {
                QgError::InvalidToken("The access token is invalid".to_string())
            }
        }
    }
}

impl From<AdmissionError> for QgError {
    fn from(err: AdmissionError) -> Self {
        match err {
            AdmissionError::StoreUnavailable(reason) => QgError::StoreUnavailable(reason),
            AdmissionError::InvalidPolicy(reason) => QgError::Internal(reason),
        }
    }
}

impl From<CatalogError> for QgError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::UnknownResource(name) => QgError::ResourceDenied(name),
            CatalogError::Database(reason) => QgError::FetchFailed(reason),
            CatalogError::Timeout => QgError::FetchFailed("data source timed out".to_string()),
            CatalogError::InvalidRecord(reason) => QgError::FetchFailed(reason),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::body::Body;
    use http_body_util::BodyExt;

    async fn read_body_json(body: Body) -> serde_json::Value {
        let bytes = body.collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(format!("{}", QgError::MissingToken), "Missing bearer token");
        assert_eq!(
            format!("{}", QgError::InvalidToken("bad".to_string())),
            "Invalid token: bad"
        );
        assert_eq!(format!("{}", QgError::RateLimited), "Rate limit exceeded");
        assert_eq!(
            format!("{}", QgError::StoreUnavailable("timeout".to_string())),
            "Counter store unavailable: timeout"
        );
        assert_eq!(
            format!("{}", QgError::ResourceDenied("users".to_string())),
            "Resource denied: users"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(QgError::MissingToken.status_code(), 401);
        assert_eq!(QgError::InvalidToken(String::new()).status_code(), 401);
        assert_eq!(QgError::TokenExpired.status_code(), 401);
        assert_eq!(QgError::TokenNotYetValid.status_code(), 401);
        assert_eq!(QgError::ResourceDenied(String::new()).status_code(), 403);
        assert_eq!(QgError::RateLimited.status_code(), 429);
        assert_eq!(QgError::StoreUnavailable(String::new()).status_code(), 429);
        assert_eq!(QgError::FetchFailed(String::new()).status_code(), 502);
        assert_eq!(QgError::BadRequest(String::new()).status_code(), 400);
        assert_eq!(QgError::NotFound(String::new()).status_code(), 404);
        assert_eq!(QgError::Internal(String::new()).status_code(), 500);
    }

    #[test]
    fn test_rate_limited_and_store_unavailable_share_code() {
        assert_eq!(QgError::RateLimited.code(), "RATE_LIMIT_EXCEEDED");
        assert_eq!(
            QgError::StoreUnavailable("down".to_string()).code(),
            QgError::RateLimited.code()
        );
    }

    #[tokio::test]
    async fn test_into_response_missing_token_has_www_authenticate() {
        let response = QgError::MissingToken.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let auth_header = response.headers().get("WWW-Authenticate").unwrap();
        assert_eq!(auth_header.to_str().unwrap(), WWW_AUTHENTICATE_VALUE);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "MISSING_TOKEN");
    }

    #[tokio::test]
    async fn test_into_response_expired() {
        let response = QgError::TokenExpired.into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().contains_key("WWW-Authenticate"));

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "TOKEN_EXPIRED");
        assert_eq!(body["error"]["message"], "The access token has expired");
    }

    #[tokio::test]
    async fn test_into_response_resource_denied() {
        let response = QgError::ResourceDenied("users".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(!response.headers().contains_key("WWW-Authenticate"));

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "RESOURCE_DENIED");
    }

    #[tokio::test]
    async fn test_into_response_rate_limited() {
        let response = QgError::RateLimited.into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "RATE_LIMIT_EXCEEDED");
        assert_eq!(body["error"]["message"], RATE_LIMITED_MESSAGE);
    }

    #[tokio::test]
    async fn test_into_response_store_unavailable_is_indistinguishable_from_rate_limited() {
        let rejected = QgError::RateLimited.into_response();
        let unavailable =
            QgError::StoreUnavailable("connection refused to redis://secret@cache".to_string())
                .into_response();

        assert_eq!(rejected.status(), unavailable.status());

        let rejected_body = read_body_json(rejected.into_body()).await;
        let unavailable_body = read_body_json(unavailable.into_body()).await;
        assert_eq!(rejected_body, unavailable_body);
    }

    #[tokio::test]
    async fn test_into_response_fetch_failed_hides_details() {
        let response =
            QgError::FetchFailed("relation \"products\" does not exist".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "FETCH_FAILED");
        assert!(!body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("relation"));
    }

    #[tokio::test]
    async fn test_into_response_internal_hides_details() {
        let response = QgError::Internal("signing key exploded".to_string()).into_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = read_body_json(response.into_body()).await;
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
    }

    #[test]
    fn test_from_token_error() {
        assert!(matches!(
            QgError::from(TokenError::Expired),
            QgError::TokenExpired
        ));
        assert!(matches!(
            QgError::from(TokenError::NotYetValid),
            QgError::TokenNotYetValid
        ));
        assert!(matches!(
            QgError::from(TokenError::InvalidSignature),
            QgError::InvalidToken(_)
        ));
        assert!(matches!(
            QgError::from(TokenError::MissingClaim("nbf".to_string())),
            QgError::InvalidToken(_)
        ));
        assert!(matches!(
            QgError::from(TokenError::Signing("boom".to_string())),
            QgError::Internal(_)
        ));
    }

    #[test]
    fn test_from_admission_error() {
        assert!(matches!(
            QgError::from(AdmissionError::StoreUnavailable("down".to_string())),
            QgError::StoreUnavailable(_)
        ));
    }

    #[test]
    fn test_from_catalog_error() {
        assert!(matches!(
            QgError::from(CatalogError::Timeout),
            QgError::FetchFailed(_)
        ));
        assert!(matches!(
            QgError::from(CatalogError::UnknownResource("users".to_string())),
            QgError::ResourceDenied(_)
        ));
    }
}
