//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `SHOPFRONT_API_BASE_URL` - Storefront API base URL (default: `http://localhost:5000`)
//! - `SHOPFRONT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: none)
//! - `SHOPFRONT_CATALOG_CACHE_TTL_SECS` - Product cache TTL (default: 300)
//! - `SHOPFRONT_FREE_SHIPPING_THRESHOLD` - Subtotal for free shipping (default: 200)
//! - `SHOPFRONT_FLAT_SHIPPING_FEE` - Shipping fee below the threshold (default: 15)
//! - `SHOPFRONT_DEFAULT_COUNTRY` - Country used when checkout omits one (default: India)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use rust_decimal::Decimal;
use shopfront_core::{Price, ShippingPolicy};
use thiserror::Error;
use url::Url;

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_CATALOG_CACHE_TTL_SECS: u64 = 300;
const DEFAULT_COUNTRY: &str = "India";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the storefront REST API (always ends with `/`)
    pub api_base_url: Url,
    /// Request timeout; `None` waits indefinitely
    pub request_timeout: Option<Duration>,
    /// How long catalog responses stay cached
    pub catalog_cache_ttl: Duration,
    /// Shipping cost policy used at checkout
    pub shipping: ShippingPolicy,
    /// Country used for shipping addresses that do not name one
    pub default_country: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: Url::parse(&format!("{DEFAULT_API_BASE_URL}/"))
                .unwrap_or_else(|_| unreachable!("default base URL is valid")),
            request_timeout: None,
            catalog_cache_ttl: Duration::from_secs(DEFAULT_CATALOG_CACHE_TTL_SECS),
            shipping: ShippingPolicy::default(),
            default_country: DEFAULT_COUNTRY.to_string(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "SHOPFRONT_API_BASE_URL",
            &get_env_or_default("SHOPFRONT_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;

        let request_timeout = get_optional_env("SHOPFRONT_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_secs("SHOPFRONT_REQUEST_TIMEOUT_SECS", &raw))
            .transpose()?;

        let catalog_cache_ttl = parse_secs(
            "SHOPFRONT_CATALOG_CACHE_TTL_SECS",
            &get_env_or_default(
                "SHOPFRONT_CATALOG_CACHE_TTL_SECS",
                &DEFAULT_CATALOG_CACHE_TTL_SECS.to_string(),
            ),
        )?;

        let defaults = ShippingPolicy::default();
        let shipping = ShippingPolicy {
            free_threshold: get_optional_env("SHOPFRONT_FREE_SHIPPING_THRESHOLD")
                .map(|raw| parse_price("SHOPFRONT_FREE_SHIPPING_THRESHOLD", &raw))
                .transpose()?
                .unwrap_or(defaults.free_threshold),
            flat_fee: get_optional_env("SHOPFRONT_FLAT_SHIPPING_FEE")
                .map(|raw| parse_price("SHOPFRONT_FLAT_SHIPPING_FEE", &raw))
                .transpose()?
                .unwrap_or(defaults.flat_fee),
        };

        Ok(Self {
            api_base_url,
            request_timeout,
            catalog_cache_ttl,
            shipping,
            default_country: get_env_or_default("SHOPFRONT_DEFAULT_COUNTRY", DEFAULT_COUNTRY),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Configuration pointing at a specific API base URL, other values default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL is not an absolute http(s) URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("api_base_url", base_url)?,
            ..Self::default()
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an http(s) base URL, normalizing it to end with `/` so relative
/// joins keep any path prefix.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be an absolute URL with a host".to_string(),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_secs(key: &str, raw: &str) -> Result<Duration, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map(Duration::from_secs)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_price(key: &str, raw: &str) -> Result<Price, ConfigError> {
    let amount = raw
        .trim()
        .parse::<Decimal>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Price::new(amount).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("TEST", "https://shop.example.com/backend").unwrap();
        assert_eq!(url.as_str(), "https://shop.example.com/backend/");

        let url = parse_base_url("TEST", "http://localhost:5000").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/");
    }

    #[test]
    fn test_parse_base_url_rejects_other_schemes() {
        let err = parse_base_url("TEST", "ftp://example.com").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(_, _)));

        assert!(parse_base_url("TEST", "not a url").is_err());
        assert!(parse_base_url("TEST", "mailto:someone@example.com").is_err());
    }

    #[test]
    fn test_parse_secs() {
        assert_eq!(parse_secs("TEST", " 30 ").unwrap(), Duration::from_secs(30));
        assert!(parse_secs("TEST", "-1").is_err());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("TEST", "199.50").unwrap(), Price::from_minor(19_950));
        assert!(parse_price("TEST", "-1").is_err());
        assert!(parse_price("TEST", "free").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url.as_str(), "http://localhost:5000/");
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.catalog_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.shipping, ShippingPolicy::default());
        assert_eq!(config.default_country, "India");
    }

    #[test]
    fn test_with_base_url() {
        let config = ClientConfig::with_base_url("http://127.0.0.1:4000").unwrap();
        assert_eq!(config.api_base_url.as_str(), "http://127.0.0.1:4000/");
        assert!(ClientConfig::with_base_url("file:///tmp").is_err());
    }
}
