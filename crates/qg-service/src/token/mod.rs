//! Token minting and verification.
//!
//! Tokens are HS256 JWTs signed with the process-wide secret. One token
//! format serves both caller authentication and forward-only pagination
//! state.

mod claims;
mod service;

pub use claims::ClaimSet;
pub use service::TokenService;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token is missing required claim '{0}'")]
    MissingClaim(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token is not yet valid")]
    NotYetValid,

    /// Claims could not be serialized or signed.
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

impl TokenError {
    /// Bounded label for `qg_token_operations_total`.
    pub fn metric_status(&self) -> &'static str {
        match self {
            TokenError::Malformed(_) => "malformed",
            TokenError::InvalidSignature => "invalid_signature",
            TokenError::MissingClaim(_) => "missing_claim",
            TokenError::Expired => "expired",
            TokenError::NotYetValid => "not_yet_valid",
            TokenError::Signing(_) => "signing_error",
        }
    }
}
