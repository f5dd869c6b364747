//! Query Gateway configuration.
//!
//! Configuration is loaded from environment variables. Sensitive fields
//! (database URL, Redis URL, signing secret) are redacted in Debug output.

use base64::{engine::general_purpose, Engine as _};
use common::jwt::{DEFAULT_CLOCK_SKEW, MAX_CLOCK_SKEW};
use common::secret::SecretSlice;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default bind address.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default token issuer (`iss`).
pub const DEFAULT_TOKEN_ISSUER: &str = "http://example.org";

/// Default token audience (`aud`).
pub const DEFAULT_TOKEN_AUDIENCE: &str = "http://example.com";

/// Default admitted requests per window per (subject, resource).
pub const DEFAULT_RATE_LIMIT_MAX_REQUESTS: u32 = 2;

/// Default sliding window length in seconds.
pub const DEFAULT_RATE_LIMIT_WINDOW_SECONDS: u64 = 1;

/// Default records per page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Upper bound on `PAGE_SIZE`.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Default allow-list of resource names.
pub const DEFAULT_ALLOWED_RESOURCES: &str = "products,customers";

/// Default counter store round-trip timeout in milliseconds.
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 250;

/// Default data fetch timeout in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 5000;

/// Minimum decoded length of the HS256 signing secret.
pub const MIN_SIGNING_SECRET_BYTES: usize = 32;

/// Which counter store backs the admission controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterStoreKind {
    /// Shared Redis instance (multi-instance deployments).
    Redis,
    /// Process-local store (single-instance deployments, development).
    Memory,
}

/// Query Gateway configuration.
#[derive(Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Redis connection URL. Required when `counter_store` is `Redis`.
    pub redis_url: Option<String>,

    /// Counter store backend.
    pub counter_store: CounterStoreKind,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// HS256 signing secret (decoded from base64).
    pub jwt_secret: SecretSlice<u8>,

    /// `iss` stamped into minted tokens and required on verification.
    pub token_issuer: String,

    /// `aud` stamped into minted tokens and required on verification.
    pub token_audience: String,

    /// Clock skew tolerance in seconds for time-claim validation.
    pub jwt_clock_skew_seconds: u64,

    /// Admitted requests per window per (subject, resource).
    pub rate_limit_max_requests: u32,

    /// Sliding window length in seconds.
    pub rate_limit_window_seconds: u64,

    /// Records per page, shared by all resources.
    pub page_size: u32,

    /// Resource names that may be queried.
    pub allowed_resources: Vec<String>,

    /// Counter store round-trip timeout in milliseconds.
    pub store_timeout_ms: u64,

    /// Data fetch timeout in milliseconds.
    pub fetch_timeout_ms: u64,

    /// Whether `POST /api/v1/token` is served.
    pub token_issuance_enabled: bool,
}

impl Config {
    /// Sliding window as a `Duration`.
    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_seconds)
    }

    /// Clock skew as a `Duration`.
    pub fn jwt_clock_skew(&self) -> Duration {
        Duration::from_secs(self.jwt_clock_skew_seconds)
    }

    /// Counter store timeout as a `Duration`.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Fetch timeout as a `Duration`.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

/// Custom Debug implementation that redacts sensitive fields.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[REDACTED]")
            .field("redis_url", &self.redis_url.as_ref().map(|_| "[REDACTED]"))
            .field("counter_store", &self.counter_store)
            .field("bind_address", &self.bind_address)
            .field("jwt_secret", &"[REDACTED]")
            .field("token_issuer", &self.token_issuer)
            .field("token_audience", &self.token_audience)
            .field("jwt_clock_skew_seconds", &self.jwt_clock_skew_seconds)
            .field("rate_limit_max_requests", &self.rate_limit_max_requests)
            .field("rate_limit_window_seconds", &self.rate_limit_window_seconds)
            .field("page_size", &self.page_size)
            .field("allowed_resources", &self.allowed_resources)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("fetch_timeout_ms", &self.fetch_timeout_ms)
            .field("token_issuance_enabled", &self.token_issuance_enabled)
            .finish()
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid signing secret: {0}")]
    InvalidSigningSecret(String),

    #[error("Invalid JWT clock skew configuration: {0}")]
    InvalidJwtClockSkew(String),

    #[error("Invalid rate limit configuration: {0}")]
    InvalidRateLimit(String),

    #[error("Invalid page size configuration: {0}")]
    InvalidPageSize(String),

    #[error("Invalid resource allow-list: {0}")]
    InvalidAllowedResources(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = vars
            .get("DATABASE_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?
            .clone();

        let counter_store = match vars.get("COUNTER_STORE").map(|s| s.trim()) {
            None | Some("redis") => CounterStoreKind::Redis,
            Some("memory") => CounterStoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "COUNTER_STORE".to_string(),
                    reason: format!("expected 'redis' or 'memory', got '{}'", other),
                })
            }
        };

        let redis_url = vars.get("REDIS_URL").cloned();
        if counter_store == CounterStoreKind::Redis && redis_url.is_none() {
            return Err(ConfigError::MissingEnvVar("REDIS_URL".to_string()));
        }

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let secret_base64 = vars
            .get("QG_JWT_SECRET")
            .ok_or_else(|| ConfigError::MissingEnvVar("QG_JWT_SECRET".to_string()))?;

        let secret_bytes = general_purpose::STANDARD
            .decode(secret_base64.trim())
            .map_err(|e| {
                ConfigError::InvalidSigningSecret(format!("QG_JWT_SECRET is not valid base64: {}", e))
            })?;

        if secret_bytes.len() < MIN_SIGNING_SECRET_BYTES {
            return Err(ConfigError::InvalidSigningSecret(format!(
                "Expected at least {} bytes, got {}",
                MIN_SIGNING_SECRET_BYTES,
                secret_bytes.len()
            )));
        }

        let token_issuer = non_empty(vars, "QG_TOKEN_ISSUER", DEFAULT_TOKEN_ISSUER)?;
        let token_audience = non_empty(vars, "QG_TOKEN_AUDIENCE", DEFAULT_TOKEN_AUDIENCE)?;

        // Parse JWT clock skew tolerance with validation
        let jwt_clock_skew_seconds = if let Some(value_str) = vars.get("JWT_CLOCK_SKEW_SECONDS") {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be a valid integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value <= 0 {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must be positive, got {}",
                    value
                )));
            }

            let value = value.unsigned_abs();
            if value > MAX_CLOCK_SKEW.as_secs() {
                return Err(ConfigError::InvalidJwtClockSkew(format!(
                    "JWT_CLOCK_SKEW_SECONDS must not exceed {} seconds, got {}",
                    MAX_CLOCK_SKEW.as_secs(),
                    value
                )));
            }

            value
        } else {
            DEFAULT_CLOCK_SKEW.as_secs()
        };

        // Zero is legal: the controller then rejects every request.
        let rate_limit_max_requests = if let Some(value_str) = vars.get("RATE_LIMIT_MAX_REQUESTS") {
            value_str.parse::<u32>().map_err(|e| {
                ConfigError::InvalidRateLimit(format!(
                    "RATE_LIMIT_MAX_REQUESTS must be a non-negative integer, got '{}': {}",
                    value_str, e
                ))
            })?
        } else {
            DEFAULT_RATE_LIMIT_MAX_REQUESTS
        };

        let rate_limit_window_seconds =
            if let Some(value_str) = vars.get("RATE_LIMIT_WINDOW_SECONDS") {
                let value: i64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidRateLimit(format!(
                        "RATE_LIMIT_WINDOW_SECONDS must be a valid integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value <= 0 {
                    return Err(ConfigError::InvalidRateLimit(format!(
                        "RATE_LIMIT_WINDOW_SECONDS must be greater than 0, got {}",
                        value
                    )));
                }

                value.unsigned_abs()
            } else {
                DEFAULT_RATE_LIMIT_WINDOW_SECONDS
            };

        let page_size = if let Some(value_str) = vars.get("PAGE_SIZE") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidPageSize(format!(
                    "PAGE_SIZE must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 || value > MAX_PAGE_SIZE {
                return Err(ConfigError::InvalidPageSize(format!(
                    "PAGE_SIZE must be between 1 and {}, got {}",
                    MAX_PAGE_SIZE, value
                )));
            }

            value
        } else {
            DEFAULT_PAGE_SIZE
        };

        let allowed_raw = vars
            .get("ALLOWED_RESOURCES")
            .map(String::as_str)
            .unwrap_or(DEFAULT_ALLOWED_RESOURCES);
        let allowed_resources = parse_allowed_resources(allowed_raw)?;

        let store_timeout_ms = positive_millis(vars, "STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT_MS)?;
        let fetch_timeout_ms = positive_millis(vars, "FETCH_TIMEOUT_MS", DEFAULT_FETCH_TIMEOUT_MS)?;

        let token_issuance_enabled = match vars.get("TOKEN_ISSUANCE_ENABLED").map(|s| s.trim()) {
            None | Some("false") => false,
            Some("true") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    name: "TOKEN_ISSUANCE_ENABLED".to_string(),
                    reason: format!("expected 'true' or 'false', got '{}'", other),
                })
            }
        };

        Ok(Config {
            database_url,
            redis_url,
            counter_store,
            bind_address,
            jwt_secret: SecretSlice::from(secret_bytes),
            token_issuer,
            token_audience,
            jwt_clock_skew_seconds,
            rate_limit_max_requests,
            rate_limit_window_seconds,
            page_size,
            allowed_resources,
            store_timeout_ms,
            fetch_timeout_ms,
            token_issuance_enabled,
        })
    }
}

fn non_empty(
    vars: &HashMap<String, String>,
    name: &str,
    default: &str,
) -> Result<String, ConfigError> {
    match vars.get(name) {
        None => Ok(default.to_string()),
        Some(v) if v.trim().is_empty() => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must not be empty".to_string(),
        }),
        Some(v) => Ok(v.trim().to_string()),
    }
}

fn positive_millis(
    vars: &HashMap<String, String>,
    name: &str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(value_str) = vars.get(name) else {
        return Ok(default);
    };

    let value: u64 = value_str.parse().map_err(|e| ConfigError::InvalidValue {
        name: name.to_string(),
        reason: format!("must be a valid positive integer, got '{}': {}", value_str, e),
    })?;

    if value == 0 {
        return Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "must be greater than 0".to_string(),
        });
    }

    Ok(value)
}

/// Resource names are interpolated into SQL as quoted identifiers, so only
/// `[A-Za-z0-9_]` is accepted.
fn parse_allowed_resources(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut resources: Vec<String> = Vec::new();

    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ConfigError::InvalidAllowedResources(format!(
                "'{}' contains characters other than letters, digits and '_'",
                name
            )));
        }
        if !resources.iter().any(|r| r == name) {
            resources.push(name.to_string());
        }
    }

    if resources.is_empty() {
        return Err(ConfigError::InvalidAllowedResources(
            "ALLOWED_RESOURCES must name at least one resource".to_string(),
        ));
    }

    Ok(resources)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use common::secret::ExposeSecret;

    fn test_secret_base64() -> String {
        general_purpose::STANDARD.encode([7u8; 32])
    }

    fn base_vars() -> HashMap<String, String> {
        HashMap::from([
            (
                "DATABASE_URL".to_string(),
                "postgresql://localhost/qg_test".to_string(),
            ),
            (
                "REDIS_URL".to_string(),
                "redis://:hunter2@localhost:6379".to_string(),
            ),
            ("QG_JWT_SECRET".to_string(), test_secret_base64()),
        ])
    }

    #[test]
    fn test_from_vars_success_with_defaults() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        assert_eq!(config.database_url, "postgresql://localhost/qg_test");
        assert_eq!(config.counter_store, CounterStoreKind::Redis);
        assert_eq!(config.bind_address, DEFAULT_BIND_ADDRESS);
        assert_eq!(config.jwt_secret.expose_secret().len(), 32);
        assert_eq!(config.token_issuer, DEFAULT_TOKEN_ISSUER);
        assert_eq!(config.token_audience, DEFAULT_TOKEN_AUDIENCE);
        assert_eq!(config.jwt_clock_skew_seconds, DEFAULT_CLOCK_SKEW.as_secs());
        assert_eq!(config.rate_limit_max_requests, 2);
        assert_eq!(config.rate_limit_window(), Duration::from_secs(1));
        assert_eq!(config.page_size, 10);
        assert_eq!(config.allowed_resources, vec!["products", "customers"]);
        assert_eq!(config.store_timeout(), Duration::from_millis(250));
        assert_eq!(config.fetch_timeout(), Duration::from_millis(5000));
        assert!(!config.token_issuance_enabled);
    }

    #[test]
    fn test_from_vars_success_with_custom_values() {
        let mut vars = base_vars();
        vars.insert("BIND_ADDRESS".to_string(), "127.0.0.1:9000".to_string());
        vars.insert("QG_TOKEN_ISSUER".to_string(), "https://issuer.test".to_string());
        vars.insert("QG_TOKEN_AUDIENCE".to_string(), "https://api.test".to_string());
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "120".to_string());
        vars.insert("RATE_LIMIT_MAX_REQUESTS".to_string(), "50".to_string());
        vars.insert("RATE_LIMIT_WINDOW_SECONDS".to_string(), "60".to_string());
        vars.insert("PAGE_SIZE".to_string(), "25".to_string());
        vars.insert(
            "ALLOWED_RESOURCES".to_string(),
            " orders , invoices,orders ".to_string(),
        );
        vars.insert("STORE_TIMEOUT_MS".to_string(), "100".to_string());
        vars.insert("FETCH_TIMEOUT_MS".to_string(), "2000".to_string());
        vars.insert("TOKEN_ISSUANCE_ENABLED".to_string(), "true".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");

        assert_eq!(config.bind_address, "127.0.0.1:9000");
        assert_eq!(config.token_issuer, "https://issuer.test");
        assert_eq!(config.token_audience, "https://api.test");
        assert_eq!(config.jwt_clock_skew_seconds, 120);
        assert_eq!(config.rate_limit_max_requests, 50);
        assert_eq!(config.rate_limit_window_seconds, 60);
        assert_eq!(config.page_size, 25);
        assert_eq!(config.allowed_resources, vec!["orders", "invoices"]);
        assert_eq!(config.store_timeout_ms, 100);
        assert_eq!(config.fetch_timeout_ms, 2000);
        assert!(config.token_issuance_enabled);
    }

    #[test]
    fn test_from_vars_missing_database_url() {
        let mut vars = base_vars();
        vars.remove("DATABASE_URL");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "DATABASE_URL"));
    }

    #[test]
    fn test_from_vars_missing_secret() {
        let mut vars = base_vars();
        vars.remove("QG_JWT_SECRET");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "QG_JWT_SECRET"));
    }

    #[test]
    fn test_redis_url_required_for_redis_store() {
        let mut vars = base_vars();
        vars.remove("REDIS_URL");

        let result = Config::from_vars(&vars);
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(v)) if v == "REDIS_URL"));
    }

    #[test]
    fn test_memory_store_does_not_need_redis_url() {
        let mut vars = base_vars();
        vars.remove("REDIS_URL");
        vars.insert("COUNTER_STORE".to_string(), "memory".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.counter_store, CounterStoreKind::Memory);
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_unknown_counter_store_rejected() {
        let mut vars = base_vars();
        vars.insert("COUNTER_STORE".to_string(), "memcached".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { name, .. }) if name == "COUNTER_STORE")
        );
    }

    #[test]
    fn test_secret_invalid_base64() {
        let mut vars = base_vars();
        vars.insert("QG_JWT_SECRET".to_string(), "not-valid-base64!@#$".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidSigningSecret(msg)) if msg.contains("not valid base64"))
        );
    }

    #[test]
    fn test_secret_too_short() {
        let mut vars = base_vars();
        vars.insert(
            "QG_JWT_SECRET".to_string(),
            general_purpose::STANDARD.encode([1u8; 16]),
        );

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidSigningSecret(msg)) if msg.contains("at least 32 bytes, got 16"))
        );
    }

    #[test]
    fn test_secret_longer_than_minimum_accepted() {
        let mut vars = base_vars();
        vars.insert(
            "QG_JWT_SECRET".to_string(),
            general_purpose::STANDARD.encode([1u8; 64]),
        );

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.jwt_secret.expose_secret().len(), 64);
    }

    #[test]
    fn test_empty_issuer_rejected() {
        let mut vars = base_vars();
        vars.insert("QG_TOKEN_ISSUER".to_string(), "   ".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { name, .. }) if name == "QG_TOKEN_ISSUER")
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must be positive"))
        );
    }

    #[test]
    fn test_jwt_clock_skew_rejects_too_large() {
        let mut vars = base_vars();
        vars.insert("JWT_CLOCK_SKEW_SECONDS".to_string(), "601".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidJwtClockSkew(msg)) if msg.contains("must not exceed 600"))
        );
    }

    #[test]
    fn test_rate_limit_accepts_zero_max_requests() {
        let mut vars = base_vars();
        vars.insert("RATE_LIMIT_MAX_REQUESTS".to_string(), "0".to_string());

        let config = Config::from_vars(&vars).expect("Config should load successfully");
        assert_eq!(config.rate_limit_max_requests, 0);
    }

    #[test]
    fn test_rate_limit_rejects_negative_max_requests() {
        let mut vars = base_vars();
        vars.insert("RATE_LIMIT_MAX_REQUESTS".to_string(), "-1".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRateLimit(msg)) if msg.contains("non-negative integer"))
        );
    }

    #[test]
    fn test_rate_limit_window_rejects_zero() {
        let mut vars = base_vars();
        vars.insert("RATE_LIMIT_WINDOW_SECONDS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRateLimit(msg)) if msg.contains("greater than 0"))
        );
    }

    #[test]
    fn test_rate_limit_window_rejects_negative() {
        let mut vars = base_vars();
        vars.insert("RATE_LIMIT_WINDOW_SECONDS".to_string(), "-5".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidRateLimit(msg)) if msg.contains("greater than 0"))
        );
    }

    #[test]
    fn test_page_size_bounds() {
        let mut vars = base_vars();
        vars.insert("PAGE_SIZE".to_string(), "0".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidPageSize(_))
        ));

        vars.insert("PAGE_SIZE".to_string(), "1001".to_string());
        assert!(matches!(
            Config::from_vars(&vars),
            Err(ConfigError::InvalidPageSize(_))
        ));

        vars.insert("PAGE_SIZE".to_string(), "1000".to_string());
        assert_eq!(Config::from_vars(&vars).unwrap().page_size, 1000);
    }

    #[test]
    fn test_allowed_resources_rejects_identifier_injection() {
        let mut vars = base_vars();
        vars.insert(
            "ALLOWED_RESOURCES".to_string(),
            "products,users\"; DROP TABLE users; --".to_string(),
        );

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAllowedResources(_))
        ));
    }

    #[test]
    fn test_allowed_resources_rejects_empty_list() {
        let mut vars = base_vars();
        vars.insert("ALLOWED_RESOURCES".to_string(), " , ,".to_string());

        let result = Config::from_vars(&vars);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidAllowedResources(_))
        ));
    }

    #[test]
    fn test_timeouts_reject_zero() {
        let mut vars = base_vars();
        vars.insert("STORE_TIMEOUT_MS".to_string(), "0".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { name, .. }) if name == "STORE_TIMEOUT_MS")
        );
    }

    #[test]
    fn test_token_issuance_flag_rejects_garbage() {
        let mut vars = base_vars();
        vars.insert("TOKEN_ISSUANCE_ENABLED".to_string(), "yes".to_string());

        let result = Config::from_vars(&vars);
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { name, .. }) if name == "TOKEN_ISSUANCE_ENABLED")
        );
    }

    #[test]
    fn test_debug_redacts_sensitive_fields() {
        let config = Config::from_vars(&base_vars()).expect("Config should load successfully");

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("postgresql://"));
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains(&test_secret_base64()));
    }
}
