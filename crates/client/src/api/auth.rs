//! Authentication endpoints.
//!
//! Entering either flow clears the current session before anything else, so a
//! failed login never leaves stale credentials behind.

use reqwest::Method;
use secrecy::SecretString;
use shopfront_core::{Email, PasswordPolicy, UserId};
use tracing::{info, instrument};

use super::types::{Acknowledgement, LoginRequest, LoginResponse, RegisterRequest};
use super::{ApiClient, ApiError, Auth};
use crate::session::Credentials;

impl ApiClient {
    /// Create an account.
    ///
    /// Input is checked locally first; nothing is sent if it fails.
    /// Returns the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for bad input, or another error if
    /// the backend rejects the request.
    #[instrument(skip(self, password))]
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<String, ApiError> {
        self.sign_out();

        let name = name.trim();
        if name.is_empty() {
            return Err(ApiError::Validation("Name is required".to_string()));
        }
        let email = Email::parse(email).map_err(|e| ApiError::Validation(e.to_string()))?;
        PasswordPolicy::default()
            .check(password)
            .map_err(|e| ApiError::Validation(e.to_string()))?;

        let url = self.endpoint(&["api", "auth", "register"])?;
        let body = RegisterRequest {
            email: email.as_str(),
            password,
            name,
        };
        let ack: Acknowledgement = self
            .execute(self.request(Method::POST, url, Auth::Public)?.json(&body))
            .await?;

        info!(email = %email, "Account registered");
        Ok(ack
            .message
            .unwrap_or_else(|| "Registration successful".to_string()))
    }

    /// Sign in and store the returned credentials in the session.
    ///
    /// Returns the backend's welcome message.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for bad input, or another error if
    /// the backend rejects the credentials.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ApiError> {
        self.sign_out();

        let email = Email::parse(email).map_err(|e| ApiError::Validation(e.to_string()))?;
        if password.is_empty() {
            return Err(ApiError::Validation("Password is required".to_string()));
        }

        let url = self.endpoint(&["api", "auth", "login"])?;
        let body = LoginRequest {
            email: email.as_str(),
            password,
        };
        let response: LoginResponse = self
            .execute(self.request(Method::POST, url, Auth::Public)?.json(&body))
            .await?;

        let user_id = UserId::new(response.user_id);
        info!(user_id = %user_id, "Signed in");

        self.inner.session.set(Credentials {
            access_token: SecretString::from(response.access_token),
            user_id,
            email,
        });

        Ok(response
            .message
            .unwrap_or_else(|| "Login successful".to_string()))
    }

    /// Forget the current credentials.
    pub fn sign_out(&self) {
        self.inner.session.clear();
    }
}
