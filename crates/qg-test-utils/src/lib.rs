//! # QG Test Utilities
//!
//! Shared test utilities for the Query Gateway (QG) service.
//!
//! This crate provides:
//! - Instrumented counter stores (`CountingStore`, failing and slow variants)
//! - An in-memory data source (`MockDataSource`)
//! - Token builders (`TestTokenBuilder`)
//! - Server test harness (`TestQgServer` for E2E tests)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use qg_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() -> Result<()> {
//!     let server = TestQgServer::spawn().await?;
//!     let client = reqwest::Client::new();
//!
//!     let response = client
//!         .get(&format!("{}/health", server.url()))
//!         .send()
//!         .await?;
//!
//!     assert_eq!(response.status(), 200);
//!     Ok(())
//! }
//! ```

pub mod mock_data;
pub mod mock_store;
pub mod server_harness;
pub mod token_builders;

// Re-export commonly used items
pub use mock_data::*;
pub use mock_store::*;
pub use server_harness::*;
pub use token_builders::*;

/// Raw 32-byte signing secret every fixture shares.
pub const TEST_SECRET_BYTES: [u8; 32] = [7u8; 32];

/// Test signing secret, base64-encoded as `QG_JWT_SECRET` expects.
pub fn test_secret_base64() -> String {
    use base64::{engine::general_purpose, Engine as _};
    general_purpose::STANDARD.encode(TEST_SECRET_BYTES)
}
