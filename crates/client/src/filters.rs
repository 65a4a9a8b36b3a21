//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Currency symbol of the store.
pub const CURRENCY_SYMBOL: &str = "₹";

/// Formats an amount in the store currency.
///
/// Usage in templates: `{{ order.total_amount|rupees }}`
#[askama::filter_fn]
pub fn rupees(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("{CURRENCY_SYMBOL}{amount}"))
}
