use super::{ClaimSet, TokenError};
use crate::observability::metrics::record_token_operation;
use common::jwt::{check_token_shape, validate_exp_at, validate_iat_at, validate_nbf_at};
use common::secret::{ExposeSecret, SecretSlice};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use std::time::Duration;

/// Mints and verifies HS256 tokens.
///
/// Stateless apart from the signing keys, which are derived once from the
/// process-wide secret and only read afterwards. Safe to share behind an
/// `Arc` across request handlers.
///
/// # Security
///
/// - Tokens are shape- and size-checked BEFORE any base64 or JSON work
/// - Only HS256 is accepted; any other `alg` header is rejected
/// - `iss` and `aud` must match this service's configuration
/// - `iat` and `nbf` are required; `exp` is enforced only when present
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    clock_skew: Duration,
}

impl TokenService {
    /// Create a token service from the signing secret.
    ///
    /// # Arguments
    ///
    /// * `secret` - HS256 key material
    /// * `issuer` - `iss` stamped on minted tokens and required on verify
    /// * `audience` - `aud` stamped on minted tokens and required on verify
    /// * `clock_skew` - tolerance applied to `iat`, `nbf` and `exp`
    pub fn new(
        secret: &SecretSlice<u8>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        clock_skew: Duration,
    ) -> Self {
        let issuer = issuer.into();
        let audience = audience.into();

        let mut validation = Validation::new(Algorithm::HS256);
        // Time claims are checked by hand so that skew handling and error
        // variants stay under our control.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["iss", "aud"]);
        validation.set_issuer(&[issuer.as_str()]);
        validation.set_audience(&[audience.as_str()]);

        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret()),
            validation,
            issuer,
            audience,
            clock_skew,
        }
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Claims for a caller token identifying `subject`.
    pub fn caller_claims(&self, subject: impl Into<String>) -> ClaimSet {
        ClaimSet::new(&self.issuer, &self.audience).with_subject(subject)
    }

    /// Claims for a continuation token: the next page plus the subject it
    /// was minted for, and nothing else beyond issuer, audience and time
    /// claims.
    ///
    /// `expires_at` is the inbound token's `exp`. A continuation token never
    /// outlives the token it continues.
    pub fn continuation_claims(
        &self,
        subject: impl Into<String>,
        next_page: u32,
        expires_at: Option<i64>,
    ) -> ClaimSet {
        let claims = ClaimSet::new(&self.issuer, &self.audience)
            .with_subject(subject)
            .with_page(next_page);
        match expires_at {
            Some(exp) => claims.with_expiry(exp),
            None => claims,
        }
    }

    /// Mint a token from `claims`, filling `iat`/`nbf` with the current time
    /// when absent.
    pub fn mint(&self, claims: &ClaimSet) -> Result<String, TokenError> {
        self.mint_at(claims, chrono::Utc::now().timestamp())
    }

    /// Mint with an explicit `now`, for deterministic tests.
    pub fn mint_at(&self, claims: &ClaimSet, now: i64) -> Result<String, TokenError> {
        let stamped = stamp(claims, now);

        let result = encode(&Header::new(Algorithm::HS256), &stamped, &self.encoding_key)
            .map_err(|e| {
                tracing::error!(target: "qg.token", error = %e, "Failed to sign token");
                TokenError::Signing(e.to_string())
            });

        match &result {
            Ok(_) => record_token_operation("mint", "success"),
            Err(e) => record_token_operation("mint", e.metric_status()),
        }

        result
    }

    /// Verify a token against the current time and recover its claims.
    pub fn verify(&self, token: &str) -> Result<ClaimSet, TokenError> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// Verify with an explicit `now`, for deterministic tests.
    ///
    /// # Errors
    ///
    /// - `Malformed`: wrong shape, oversized, undecodable, wrong algorithm,
    ///   issuer or audience
    /// - `InvalidSignature`: signature does not match the payload
    /// - `MissingClaim`: `iss`, `aud`, `iat` or `nbf` absent
    /// - `NotYetValid`: `iat` or `nbf` beyond the skew tolerance
    /// - `Expired`: `exp` present and in the past beyond the skew tolerance
    pub fn verify_at(&self, token: &str, now: i64) -> Result<ClaimSet, TokenError> {
        let result = self.verify_inner(token, now);

        match &result {
            Ok(_) => record_token_operation("verify", "success"),
            Err(e) => {
                tracing::debug!(target: "qg.token", error = %e, "Token verification failed");
                record_token_operation("verify", e.metric_status());
            }
        }

        result
    }

    fn verify_inner(&self, token: &str, now: i64) -> Result<ClaimSet, TokenError> {
        check_token_shape(token).map_err(|e| TokenError::Malformed(format!("{:?}", e)))?;

        let claims = decode::<ClaimSet>(token, &self.decoding_key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::InvalidSignature,
                ErrorKind::MissingRequiredClaim(claim) => TokenError::MissingClaim(claim.clone()),
                other => TokenError::Malformed(format!("{:?}", other)),
            })?
            .claims;

        let iat = claims
            .iat
            .ok_or_else(|| TokenError::MissingClaim("iat".to_string()))?;
        let nbf = claims
            .nbf
            .ok_or_else(|| TokenError::MissingClaim("nbf".to_string()))?;

        validate_iat_at(iat, self.clock_skew, now).map_err(|_| TokenError::NotYetValid)?;
        validate_nbf_at(nbf, self.clock_skew, now).map_err(|_| TokenError::NotYetValid)?;

        if let Some(exp) = claims.exp {
            validate_exp_at(exp, self.clock_skew, now).map_err(|_| TokenError::Expired)?;
        }

        Ok(claims)
    }
}

/// Fill `iat`/`nbf` with `now` where absent; present values are kept.
fn stamp(claims: &ClaimSet, now: i64) -> ClaimSet {
    let mut stamped = claims.clone();
    stamped.iat.get_or_insert(now);
    stamped.nbf.get_or_insert(now);
    stamped
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("clock_skew", &self.clock_skew)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}
