//! Shopfront Core - Shared domain types.
//!
//! This crate provides the domain types used across all Shopfront components:
//! - `client` - REST adapter, cart store, checkout and order viewing
//! - `cli` - Command-line surface over the client library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. The optimistic cart patches, shipping quotes and input validation
//! live here so they can be tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, products, carts, orders and policies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
