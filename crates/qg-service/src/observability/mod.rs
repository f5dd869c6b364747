//! Observability for the Query Gateway.
//!
//! # Privacy by Default
//!
//! Instrumented entry points use `#[instrument(skip_all)]` and name their
//! fields explicitly. Fields fall into three groups:
//! - **SAFE**: logged in plaintext (resource names, pages, decisions)
//! - **HASHED**: SHA-256 hashed for correlation (token subjects)
//! - **NEVER**: must never appear in logs (tokens, signing secret, store URLs)

pub mod metrics;

use sha2::{Digest, Sha256};

/// Hash a field value for correlation in logs (SHA-256, first 8 hex chars).
///
/// Used for token subjects, which need correlation across log entries but
/// should not be stored in plaintext.
pub fn hash_for_correlation(value: &str) -> String {
    let digest = Sha256::digest(value.as_bytes());
    let prefix: Vec<u8> = digest.iter().take(4).copied().collect();
    hex::encode(prefix)
}
