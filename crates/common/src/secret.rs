//! Secret types for protecting sensitive values from accidental logging.
//!
//! This module re-exports types from the [`secrecy`] crate. Use these types for
//! the token signing key, database and Redis URLs that embed credentials, and
//! bearer tokens held longer than a single function call.
//!
//! # Compile-Time Safety
//!
//! `SecretBox<T>`, `SecretSlice<T>` and `SecretString` implement `Debug` with
//! redaction, so any struct deriving `Debug` that holds one of them gets safe
//! logging behavior for free.
//!
//! # Memory Safety
//!
//! Secrets are zeroized when dropped.
//!
//! # Example
//!
//! ```rust
//! use common::secret::{ExposeSecret, SecretSlice};
//!
//! #[derive(Debug)]
//! struct SigningConfig {
//!     issuer: String,
//!     key: SecretSlice<u8>, // Debug shows "[REDACTED]"
//! }
//!
//! let cfg = SigningConfig {
//!     issuer: "http://example.org".to_string(),
//!     key: SecretSlice::from(vec![7u8; 32]),
//! };
//!
//! println!("{:?}", cfg);
//! let key: &[u8] = cfg.key.expose_secret();
//! assert_eq!(key.len(), 32);
//! ```

pub use secrecy::{ExposeSecret, SecretBox, SecretSlice, SecretString};

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_debug_is_redacted() {
        let secret = SecretString::from("hunter2");
        let debug_str = format!("{secret:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("hunter2"));
    }

    #[test]
    fn test_secret_slice_debug_is_redacted() {
        let key = SecretSlice::from(b"signing-key-material".to_vec());
        let debug_str = format!("{key:?}");

        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("signing"));
        assert_eq!(key.expose_secret(), b"signing-key-material");
    }

    #[test]
    fn test_struct_with_secret_is_safe() {
        #[allow(dead_code)]
        #[derive(Debug)]
        struct StoreConfig {
            store: String,
            redis_url: SecretString,
        }

        let cfg = StoreConfig {
            store: "redis".to_string(),
            redis_url: SecretString::from("redis://:pa55word@cache:6379"),
        };

        let debug_str = format!("{cfg:?}");

        assert!(debug_str.contains("redis"));
        assert!(debug_str.contains("REDACTED"));
        assert!(!debug_str.contains("pa55word"));
    }

    #[test]
    fn test_deserialize() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct IssueRequest {
            subject: String,
            bearer: SecretString,
        }

        let json = r#"{"subject": "user123", "bearer": "eyJhbGciOi"}"#;
        let req: IssueRequest = serde_json::from_str(json).expect("deserialize");

        assert_eq!(req.bearer.expose_secret(), "eyJhbGciOi");

        let debug = format!("{req:?}");
        assert!(!debug.contains("eyJhbGciOi"));
        assert!(debug.contains("REDACTED"));
    }
}
