//! Storefront REST API client.
//!
//! # Architecture
//!
//! - `reqwest` 0.13 for HTTP, one shared connection pool per [`ApiClient`]
//! - Every response body goes through [`envelope`] so callers never see the
//!   backend's inconsistent `data` wrapping
//! - Catalog reads are cached in memory via `moka` (5 minute TTL by default)
//! - Cart, order and payment calls carry the session's bearer token
//!
//! # Example
//!
//! ```rust,ignore
//! use shopfront_client::api::ApiClient;
//! use shopfront_client::session::SessionStore;
//!
//! let api = ApiClient::new(&config, SessionStore::new())?;
//! api.login("user@example.com", "Secret#123").await?;
//!
//! let cart = api.get_cart().await?;
//! ```

mod auth;
mod cache;
mod cart;
mod catalog;
pub mod envelope;
mod orders;
pub mod types;

pub use catalog::{PRODUCTS_PER_PAGE, ProductPage, ProductQuery};

use std::sync::Arc;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::session::SessionStore;

use cache::{CacheKey, CacheValue};

/// Header carrying a per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Message shown when the backend gives no usable error message.
pub const DEFAULT_ERROR_MESSAGE: &str = "Network error";

// =============================================================================
// Errors
// =============================================================================

/// Errors that can occur when talking to the storefront API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response: connection refused, timeout, TLS failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Missing or rejected credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Input rejected locally before any request was sent.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The backend answered with an error status.
    #[error("API error ({status}): {}", .message.as_deref().unwrap_or(DEFAULT_ERROR_MESSAGE))]
    Api {
        status: u16,
        message: Option<String>,
    },

    /// The response body matched none of the expected shapes.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Coarse classification used for reporting decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response from the backend.
    Network,
    /// Missing or expired token.
    Authorization,
    /// Client-side input check failed.
    Validation,
    /// The backend returned an error payload.
    Business,
    /// The backend returned something unreadable.
    Decode,
}

impl ApiError {
    /// Classify the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Http(_) | Self::RateLimited(_) => ErrorKind::Network,
            Self::Unauthorized(_) => ErrorKind::Authorization,
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound(_) | Self::Api { .. } => ErrorKind::Business,
            Self::Parse(_) => ErrorKind::Decode,
        }
    }

    /// Message suitable for showing to the shopper.
    ///
    /// Passes through whatever the backend said, falling back to
    /// [`DEFAULT_ERROR_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) | Self::Api { message: None, .. } => DEFAULT_ERROR_MESSAGE.to_string(),
            Self::Unauthorized(message)
            | Self::Validation(message)
            | Self::NotFound(message)
            | Self::Api {
                message: Some(message),
                ..
            } => message.clone(),
            Self::RateLimited(secs) => format!("Too many requests, try again in {secs} seconds"),
            Self::Parse(_) => "Unexpected response from server".to_string(),
        }
    }

    /// Returns `true` if the backend reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Whether a request needs the session's bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Auth {
    Public,
    Bearer,
}

/// Client for the storefront REST API.
///
/// Cheap to clone; clones share the connection pool, session and cache.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    session: SessionStore,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. no TLS backend).
    pub fn new(config: &ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let mut builder =
            reqwest::Client::builder().user_agent(concat!("shopfront/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.catalog_cache_ttl)
            .build();

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.api_base_url.clone(),
                session,
                cache,
            }),
        })
    }

    /// Session whose token authorizes cart and order calls.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Base URL the client talks to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Build an endpoint URL from path segments, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.inner.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::Validation("API base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Start a request with the correlation id and, if needed, the bearer token.
    ///
    /// Fails with [`ApiError::Unauthorized`] before anything is sent when a
    /// token is required but the session is signed out.
    fn request(&self, method: Method, url: Url, auth: Auth) -> Result<RequestBuilder, ApiError> {
        let builder = self
            .inner
            .client
            .request(method, url)
            .header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());

        match auth {
            Auth::Public => Ok(builder),
            Auth::Bearer => {
                let token = self
                    .inner
                    .session
                    .access_token()
                    .ok_or_else(|| ApiError::Unauthorized("Not signed in".to_string()))?;
                Ok(builder.bearer_auth(token.expose_secret()))
            }
        }
    }

    /// Send a request and return the response if its status is a success.
    async fn dispatch(&self, builder: RequestBuilder) -> Result<reqwest::Response, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        if !status.is_success() {
            let body = response.text().await?;
            tracing::warn!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "Storefront API returned non-success status"
            );
            return Err(error_from_response(status, &body));
        }

        Ok(response)
    }

    /// Send a request and return the body of a successful response.
    async fn send(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        Ok(self.dispatch(builder).await?.text().await?)
    }

    /// Send a request and decode the enveloped JSON payload.
    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(builder).await?;
        decode(&body)
    }
}

/// Decode a success body through the response envelope.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    envelope::unwrap_body(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(500).collect::<String>(),
            "Failed to parse storefront API response"
        );
        ApiError::Parse(e)
    })
}

/// Map an error status and its body to an [`ApiError`].
fn error_from_response(status: StatusCode, body: &str) -> ApiError {
    let message = error_message(body);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ApiError::Unauthorized(
            message.unwrap_or_else(|| "Session expired, please sign in again".to_string()),
        ),
        StatusCode::NOT_FOUND => ApiError::NotFound(message.unwrap_or_else(|| "Not found".to_string())),
        _ => ApiError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

/// Pull a human-readable message out of an error body.
///
/// Looks at `message`, `detail` and `error`, also inside a `data` wrapper.
fn error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let candidates = [&value, value.get("data").unwrap_or(&serde_json::Value::Null)];

    candidates.iter().find_map(|obj| {
        ["message", "detail", "error"].iter().find_map(|key| {
            obj.get(key)
                .and_then(serde_json::Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
        })
    })
}
