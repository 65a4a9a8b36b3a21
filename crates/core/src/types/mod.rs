//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod order;
pub mod password;
pub mod price;
pub mod product;
pub mod shipping;
pub mod status;

pub use cart::{Cart, CartItem};
pub use email::{Email, EmailError};
pub use id::*;
pub use order::{Order, OrderLine, ShippingAddress};
pub use password::{PasswordError, PasswordPolicy, PasswordRequirement};
pub use price::{Price, PriceError};
pub use product::{Category, CategoryFilter, Product};
pub use shipping::{ShippingPolicy, ShippingQuote};
pub use status::OrderStatus;
