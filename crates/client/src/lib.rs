//! Shopfront storefront client library.
//!
//! Cart reconciliation, checkout and order viewing against the storefront
//! REST backend, as a library so the CLI and tests can share it.
//!
//! - [`api`]: HTTP adapter for every backend endpoint
//! - [`cart`]: cart state store with optimistic fallback
//! - [`checkout`]: order creation and payment handoff
//! - [`orders`]: order detail viewer
//! - [`state`]: per-session wiring of the above

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod filters;
pub mod orders;
pub mod session;
pub mod state;

pub use api::{ApiClient, ApiError};
pub use config::ClientConfig;
pub use state::AppState;
