//! JWT utilities shared across Query Gateway components.
//!
//! This module provides common JWT validation utilities including:
//! - Size limits for DoS prevention
//! - Clock skew constants for time-claim validation
//! - Structural pre-checks performed before any signature work
//! - `iat` / `nbf` / `exp` validation logic
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE parsing (DoS prevention)
//! - Generic error messages prevent information leakage
//! - Time checks are pure functions of an explicit `now` so that boundary
//!   behavior is testable without wall-clock dependence
//!
//! # Usage
//!
//! ```rust,ignore
//! use common::jwt::{check_token_shape, validate_nbf, DEFAULT_CLOCK_SKEW};
//!
//! // Reject oversized or structurally broken tokens first
//! check_token_shape(token)?;
//!
//! // After verifying the signature, validate time claims
//! validate_nbf(claims.nbf, DEFAULT_CLOCK_SKEW)?;
//! ```

use std::time::Duration;
use thiserror::Error;

// =============================================================================
// Constants
// =============================================================================

/// Maximum allowed JWT size in bytes (8KB).
///
/// JWTs larger than this size are rejected BEFORE any parsing or cryptographic
/// operations.
///
/// - Caller tokens are ~200 bytes (HS256 sig, five claims)
/// - Continuation tokens are slightly larger (one extra `page` claim)
/// - 8KB limit allows for reasonable expansion while preventing abuse
pub const MAX_JWT_SIZE_BYTES: usize = 8192; // 8KB

/// Default JWT clock skew tolerance (5 minutes per NIST SP 800-63B).
///
/// Tokens with `iat` or `nbf` timestamps more than this amount in the future
/// are rejected, and `exp` is extended by the same amount.
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(300);

/// Maximum allowed JWT clock skew tolerance (10 minutes).
///
/// This prevents misconfiguration that could weaken security by allowing
/// excessively large clock skew tolerance.
pub const MAX_CLOCK_SKEW: Duration = Duration::from_secs(600);

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during JWT validation.
///
/// Structural failures share one generic message to prevent information
/// leakage. Time-window failures are distinguishable because clients need to
/// know whether re-issuing a token can help.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JwtValidationError {
    /// Token size exceeds maximum allowed.
    #[error("The access token is invalid")]
    TokenTooLarge,

    /// Token format is invalid (not a valid JWT structure).
    #[error("The access token is invalid")]
    MalformedToken,

    /// Token `iat` claim is too far in the future.
    #[error("The access token is not yet valid")]
    IatTooFarInFuture,

    /// Token `nbf` claim is in the future (beyond clock skew).
    #[error("The access token is not yet valid")]
    NotYetValid,

    /// Token `exp` claim is in the past (beyond clock skew).
    #[error("The access token has expired")]
    Expired,
}

// =============================================================================
// Functions
// =============================================================================

/// Reject tokens that are oversized or not shaped like a compact JWS.
///
/// Performs no decoding: checks the byte length against
/// [`MAX_JWT_SIZE_BYTES`] and that the token has exactly three non-empty
/// dot-separated segments.
///
/// # Errors
///
/// - `TokenTooLarge` - Token exceeds size limit
/// - `MalformedToken` - Wrong segment count or an empty segment
pub fn check_token_shape(token: &str) -> Result<(), JwtValidationError> {
    // Check token size first (DoS prevention)
    if token.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "common.jwt",
            token_size = token.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(JwtValidationError::TokenTooLarge);
    }

    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        tracing::debug!(
            target: "common.jwt",
            parts = parts.len(),
            "Token rejected: invalid JWT format"
        );
        return Err(JwtValidationError::MalformedToken);
    }

    Ok(())
}

/// Validate the `iat` (issued-at) claim with clock skew tolerance.
///
/// Rejects tokens with `iat` too far in the future, which could indicate
/// token pre-generation, clock synchronization issues, or manipulation.
///
/// # Errors
///
/// Returns `JwtValidationError::IatTooFarInFuture` if the iat timestamp is more than
/// `clock_skew` in the future.
pub fn validate_iat(iat: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_iat_at(iat, clock_skew, now)
}

/// Deterministic `iat` validation against an explicit `now` timestamp.
///
/// Prefer [`validate_iat`] in production code.
///
/// # Errors
///
/// Same as [`validate_iat`].
pub fn validate_iat_at(iat: i64, clock_skew: Duration, now: i64) -> Result<(), JwtValidationError> {
    let max_iat = now.saturating_add(skew_secs(clock_skew));

    if iat > max_iat {
        tracing::debug!(
            target: "common.jwt",
            iat = iat,
            now = now,
            max_allowed = max_iat,
            "Token rejected: iat too far in the future"
        );
        return Err(JwtValidationError::IatTooFarInFuture);
    }

    Ok(())
}

/// Validate the `nbf` (not-before) claim with clock skew tolerance.
///
/// # Errors
///
/// Returns `JwtValidationError::NotYetValid` if `nbf` is more than
/// `clock_skew` in the future.
pub fn validate_nbf(nbf: i64, clock_skew: Duration) -> Result<(), JwtValidationError> {
    let now = chrono::Utc::now().timestamp();
    validate_nbf_at(nbf, clock_skew, now)
}

/// Deterministic `nbf` validation against an explicit `now` timestamp.
///
/// # Errors
///
/// Same as [`validate_nbf`].
pub fn validate_nbf_at(nbf: i64, clock_skew: Duration, now: i64) -> Result<(), JwtValidationError> {
    let earliest_now = nbf.saturating_sub(skew_secs(clock_skew));

    if now < earliest_now {
        tracing::debug!(
            target: "common.jwt",
            nbf = nbf,
            now = now,
            "Token rejected: not yet valid"
        );
        return Err(JwtValidationError::NotYetValid);
    }

    Ok(())
}

/// Deterministic `exp` validation against an explicit `now` timestamp.
///
/// An absent `exp` means the token does not expire; callers only invoke this
/// when the claim is present.
///
/// # Errors
///
/// Returns `JwtValidationError::Expired` if `now` is past `exp` plus
/// `clock_skew`.
pub fn validate_exp_at(exp: i64, clock_skew: Duration, now: i64) -> Result<(), JwtValidationError> {
    let latest_now = exp.saturating_add(skew_secs(clock_skew));

    if now > latest_now {
        tracing::debug!(
            target: "common.jwt",
            exp = exp,
            now = now,
            "Token rejected: expired"
        );
        return Err(JwtValidationError::Expired);
    }

    Ok(())
}

fn skew_secs(clock_skew: Duration) -> i64 {
    i64::try_from(clock_skew.as_secs()).unwrap_or(i64::MAX)
}

// =============================================================================
// Tests
// =============================================================================
