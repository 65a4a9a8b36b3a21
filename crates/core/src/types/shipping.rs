//! Shipping cost policy applied at checkout.

use serde::{Deserialize, Serialize};

use super::price::Price;

/// Flat-fee shipping that becomes free above a subtotal threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingPolicy {
    /// Subtotal at or above which shipping is free.
    pub free_threshold: Price,
    /// Fee charged below the threshold.
    pub flat_fee: Price,
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold: Price::from_units(200),
            flat_fee: Price::from_units(15),
        }
    }
}

impl ShippingPolicy {
    /// Quote shipping and the order total for a cart subtotal.
    #[must_use]
    pub fn quote(&self, subtotal: Price) -> ShippingQuote {
        let shipping = if subtotal >= self.free_threshold {
            Price::ZERO
        } else {
            self.flat_fee
        };
        ShippingQuote {
            subtotal,
            shipping,
            total: subtotal + shipping,
        }
    }
}

/// Subtotal, shipping and total for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingQuote {
    pub subtotal: Price,
    pub shipping: Price,
    pub total: Price,
}

impl ShippingQuote {
    /// Returns `true` when no shipping fee applies.
    #[must_use]
    pub const fn is_free_shipping(&self) -> bool {
        self.shipping.is_zero()
    }
}
