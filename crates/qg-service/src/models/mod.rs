//! Request and response bodies for the HTTP surface.

use serde::{Deserialize, Serialize};

/// Readiness probe response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReadinessResponse {
    /// "ready" or "not_ready".
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter_store: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_source: Option<String>,

    /// Generic reason when not ready.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `POST /api/v1/token`.
#[derive(Debug, Clone, Deserialize)]
pub struct IssueTokenRequest {
    pub subject: String,

    /// Lifetime in seconds. Omitted means the token does not expire.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Response of `POST /api/v1/token`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueTokenResponse {
    pub access_token: String,
    pub token_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

/// One entry of `GET /api/v1/resources`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResourceSummary {
    pub name: String,
    pub fields: Vec<String>,
}

/// Response of `GET /api/v1/resources`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceListResponse {
    pub resources: Vec<ResourceSummary>,
    pub page_size: u32,
}
