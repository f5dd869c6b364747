//! Claim sets carried by caller and continuation tokens.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The claims bound to one token.
///
/// A claim set always names an issuer and an audience. `iat` and `nbf` are
/// filled in at mint time when absent. Caller tokens carry `sub`;
/// continuation tokens carry `sub` and the next `page`.
///
/// Claim sets are built once per token with the `with_*` constructors and
/// never mutated after minting.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Issuer. Defaulted on decode so that an absent claim is reported by
    /// the required-claim check rather than as a payload error.
    #[serde(default)]
    pub iss: String,

    /// Audience
    #[serde(default)]
    pub aud: String,

    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Expiration (Unix timestamp). Absent means the token does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Subject (caller identity)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Page the bearer may fetch next
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
}

impl ClaimSet {
    /// A claim set naming only issuer and audience.
    pub fn new(iss: impl Into<String>, aud: impl Into<String>) -> Self {
        Self {
            iss: iss.into(),
            aud: aud.into(),
            iat: None,
            nbf: None,
            exp: None,
            sub: None,
            page: None,
        }
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.sub = Some(subject.into());
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_issued_at(mut self, iat: i64) -> Self {
        self.iat = Some(iat);
        self
    }

    pub fn with_not_before(mut self, nbf: i64) -> Self {
        self.nbf = Some(nbf);
        self
    }

    pub fn with_expiry(mut self, exp: i64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// The subject, if one is present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.sub.as_deref().filter(|s| !s.is_empty())
    }
}

/// Custom Debug implementation that redacts the subject.
impl fmt::Debug for ClaimSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClaimSet")
            .field("iss", &self.iss)
            .field("aud", &self.aud)
            .field("iat", &self.iat)
            .field("nbf", &self.nbf)
            .field("exp", &self.exp)
            .field("sub", &self.sub.as_ref().map(|_| "[REDACTED]"))
            .field("page", &self.page)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_omits_absent_claims() {
        let claims = ClaimSet::new("http://example.org", "http://example.com")
            .with_subject("user123")
            .with_issued_at(1_700_000_000)
            .with_not_before(1_700_000_000);

        let json = serde_json::to_value(&claims).unwrap();
        let object = json.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["aud", "iat", "iss", "nbf", "sub"]);
    }

    #[test]
    fn test_deserialization_tolerates_missing_optional_claims() {
        let json = r#"{"iss":"a","aud":"b","page":3}"#;
        let claims: ClaimSet = serde_json::from_str(json).unwrap();

        assert_eq!(claims.page, Some(3));
        assert!(claims.sub.is_none());
        assert!(claims.exp.is_none());
    }

    #[test]
    fn test_deserialization_rejects_negative_page() {
        let json = r#"{"iss":"a","aud":"b","page":-1}"#;
        assert!(serde_json::from_str::<ClaimSet>(json).is_err());
    }

    #[test]
    fn test_subject_ignores_empty_string() {
        let claims = ClaimSet::new("a", "b").with_subject("");
        assert!(claims.subject().is_none());

        let claims = ClaimSet::new("a", "b").with_subject("user123");
        assert_eq!(claims.subject(), Some("user123"));
    }

    #[test]
    fn test_debug_redacts_subject() {
        let claims = ClaimSet::new("a", "b").with_subject("alice@example.com");
        let debug = format!("{:?}", claims);

        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("alice"));
    }
}
