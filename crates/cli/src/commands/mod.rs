//! Command implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod orders;

use shopfront_client::api::ApiError;
use shopfront_client::checkout::CheckoutError;
use shopfront_client::filters::CURRENCY_SYMBOL;
use shopfront_core::{EmailError, Price};
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A token was given without the account it belongs to.
    #[error("SHOPFRONT_EMAIL and SHOPFRONT_USER_ID must be set alongside SHOPFRONT_ACCESS_TOKEN")]
    IncompleteSession,

    /// Invalid session email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Backend request failed.
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    /// Cart could not be synchronized with the backend.
    #[error("Cart not saved: {0}")]
    CartSync(String),

    /// Checkout did not reach the payment gateway.
    #[error("{}", .0.user_message())]
    Checkout(#[from] CheckoutError),

    /// Output rendering failed.
    #[error("Template error: {0}")]
    Render(#[from] askama::Error),

    /// Writing output failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write command output to stdout.
#[allow(clippy::print_stdout)]
pub fn emit(text: &str) {
    println!("{text}");
}

/// Format an amount in the store currency.
pub fn money(price: Price) -> String {
    format!("{CURRENCY_SYMBOL}{price}")
}
