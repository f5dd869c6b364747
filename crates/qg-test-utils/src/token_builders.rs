//! Builder patterns for test tokens.
//!
//! Tokens are signed directly with `jsonwebtoken`, independent of the
//! service's `TokenService`, so tests can produce claim sets the service
//! itself would never mint.

use crate::TEST_SECRET_BYTES;
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use qg_service::config::{DEFAULT_TOKEN_AUDIENCE, DEFAULT_TOKEN_ISSUER};
use serde_json::{json, Map, Value};

/// Builder for signed HS256 test tokens.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::new()
///     .for_subject("alice")
///     .with_page(3)
///     .expires_in(3600)
///     .build();
/// ```
pub struct TestTokenBuilder {
    iss: String,
    aud: String,
    sub: Option<String>,
    iat: Option<i64>,
    nbf: Option<i64>,
    exp: Option<i64>,
    page: Option<u32>,
    secret: Vec<u8>,
    algorithm: Algorithm,
}

impl TestTokenBuilder {
    /// Defaults: default issuer and audience, subject `test-subject`,
    /// `iat = nbf = now`, no expiry, shared test secret.
    pub fn new() -> Self {
        let now = Utc::now().timestamp();
        Self {
            iss: DEFAULT_TOKEN_ISSUER.to_string(),
            aud: DEFAULT_TOKEN_AUDIENCE.to_string(),
            sub: Some("test-subject".to_string()),
            iat: Some(now),
            nbf: Some(now),
            exp: None,
            page: None,
            secret: TEST_SECRET_BYTES.to_vec(),
            algorithm: Algorithm::HS256,
        }
    }

    pub fn for_subject(mut self, subject: &str) -> Self {
        self.sub = Some(subject.to_string());
        self
    }

    pub fn without_subject(mut self) -> Self {
        self.sub = None;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn with_issuer(mut self, issuer: &str) -> Self {
        self.iss = issuer.to_string();
        self
    }

    pub fn with_audience(mut self, audience: &str) -> Self {
        self.aud = audience.to_string();
        self
    }

    /// Set expiration in seconds from now. Negative values produce an
    /// already-expired token.
    pub fn expires_in(mut self, seconds: i64) -> Self {
        self.exp = Some(Utc::now().timestamp() + seconds);
        self
    }

    /// Set not-before in seconds from now.
    pub fn not_before_in(mut self, seconds: i64) -> Self {
        self.nbf = Some(Utc::now().timestamp() + seconds);
        self
    }

    pub fn issued_at(mut self, timestamp: i64) -> Self {
        self.iat = Some(timestamp);
        self
    }

    pub fn without_not_before(mut self) -> Self {
        self.nbf = None;
        self
    }

    /// Sign with a different secret.
    pub fn signed_with(mut self, secret: &[u8]) -> Self {
        self.secret = secret.to_vec();
        self
    }

    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// The claim set as JSON.
    pub fn claims(&self) -> Value {
        let mut claims = Map::new();
        claims.insert("iss".to_string(), json!(self.iss));
        claims.insert("aud".to_string(), json!(self.aud));
        if let Some(sub) = &self.sub {
            claims.insert("sub".to_string(), json!(sub));
        }
        if let Some(iat) = self.iat {
            claims.insert("iat".to_string(), json!(iat));
        }
        if let Some(nbf) = self.nbf {
            claims.insert("nbf".to_string(), json!(nbf));
        }
        if let Some(exp) = self.exp {
            claims.insert("exp".to_string(), json!(exp));
        }
        if let Some(page) = self.page {
            claims.insert("page".to_string(), json!(page));
        }
        Value::Object(claims)
    }

    /// Sign and encode the token.
    pub fn build(self) -> String {
        encode(
            &Header::new(self.algorithm),
            &self.claims(),
            &EncodingKey::from_secret(&self.secret),
        )
        .expect("test token encoding should succeed")
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}
