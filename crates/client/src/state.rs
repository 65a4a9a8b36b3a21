//! Session-scoped application state.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::cart::CartStore;
use crate::checkout::Checkout;
use crate::config::ClientConfig;
use crate::orders::OrderViewer;
use crate::session::SessionStore;

/// Everything one shopper session needs.
///
/// This struct is cheaply cloneable via `Arc`. Stores and flows are created
/// from it explicitly rather than looked up globally.
#[derive(Clone, Debug)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Debug)]
struct AppStateInner {
    config: ClientConfig,
    api: ApiClient,
}

impl AppState {
    /// Create state for a signed-out session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Self::with_session(config, SessionStore::new())
    }

    /// Create state around an existing session.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_session(config: ClientConfig, session: SessionStore) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config, session)?;
        Ok(Self {
            inner: Arc::new(AppStateInner { config, api }),
        })
    }

    /// Get a reference to the client configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Get a reference to the storefront API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Get a reference to the session credentials.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        self.inner.api.session()
    }

    /// Start a cart store for this session. The cart is empty until fetched.
    #[must_use]
    pub fn open_cart(&self) -> CartStore<ApiClient> {
        CartStore::new(self.inner.api.clone())
    }

    /// Start a checkout flow using the configured shipping policy.
    #[must_use]
    pub fn checkout(&self) -> Checkout<ApiClient> {
        Checkout::new(
            self.inner.api.clone(),
            self.inner.config.shipping,
            self.inner.config.default_country.clone(),
        )
    }

    /// Order detail viewer.
    #[must_use]
    pub fn orders(&self) -> OrderViewer<ApiClient> {
        OrderViewer::new(self.inner.api.clone())
    }

    /// End the session: forget credentials and cached catalog data.
    pub fn sign_out(&self) {
        self.inner.api.sign_out();
        self.inner.api.invalidate_catalog();
    }
}
