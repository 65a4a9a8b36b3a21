//! Session credentials for the signed-in shopper.
//!
//! Credentials live only in memory for the lifetime of the client session.
//! Entering the login or sign-up flow clears them explicitly.

use std::sync::{Arc, PoisonError, RwLock};

use secrecy::{ExposeSecret, SecretString};
use shopfront_core::{Email, UserId};

use crate::error::report_as_shopper;

/// Session keys for authentication data.
pub mod keys {
    /// Key for the bearer access token.
    pub const ACCESS_TOKEN: &str = "accessToken";

    /// Key for the signed-in email address.
    pub const EMAIL: &str = "email";

    /// Key for the backend user id.
    pub const USER_ID: &str = "user_id";
}

/// Credentials returned by a successful login.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct Credentials {
    /// Opaque bearer token.
    pub access_token: SecretString,
    /// Backend user id.
    pub user_id: UserId,
    /// Email used to sign in.
    pub email: Email,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[REDACTED]")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish()
    }
}

impl Credentials {
    /// Session entries keyed by the storage keys in [`keys`].
    ///
    /// Exposes the access token; only hand these to trusted storage.
    #[must_use]
    pub fn entries(&self) -> [(&'static str, String); 3] {
        [
            (keys::ACCESS_TOKEN, self.access_token.expose_secret().to_string()),
            (keys::EMAIL, self.email.to_string()),
            (keys::USER_ID, self.user_id.to_string()),
        ]
    }
}

/// Shared, cheaply cloneable holder of the current session's credentials.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Arc<RwLock<Option<Credentials>>>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("credentials", &self.credentials())
            .finish()
    }
}

impl SessionStore {
    /// Create an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session that already holds credentials.
    #[must_use]
    pub fn with_credentials(credentials: Credentials) -> Self {
        report_as_shopper(Some((&credentials.user_id, &credentials.email)));
        Self {
            inner: Arc::new(RwLock::new(Some(credentials))),
        }
    }

    /// Store credentials, replacing any previous ones. Later error reports
    /// name this shopper.
    pub fn set(&self, credentials: Credentials) {
        report_as_shopper(Some((&credentials.user_id, &credentials.email)));
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(credentials);
    }

    /// Remove all credentials.
    pub fn clear(&self) {
        report_as_shopper(None);
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Current credentials, if signed in.
    #[must_use]
    pub fn credentials(&self) -> Option<Credentials> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Bearer token for authorized requests.
    #[must_use]
    pub fn access_token(&self) -> Option<SecretString> {
        self.credentials().map(|c| c.access_token)
    }

    /// Returns `true` when credentials are present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
