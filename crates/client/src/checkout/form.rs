//! Checkout contact and shipping form.

use serde::Deserialize;
use shopfront_core::{Email, EmailError, ShippingAddress, ShippingQuote};
use thiserror::Error;

use crate::api::types::CreateOrderRequest;

/// Errors found when validating a [`CheckoutForm`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    /// A required field is blank.
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Please enter a valid email address")]
    InvalidEmail(#[source] EmailError),
}

/// What the shopper typed into the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// Street address.
    pub address: String,
    /// Apartment, suite, etc.
    #[serde(default)]
    pub apartment: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    /// Falls back to the configured default country when blank.
    #[serde(default)]
    pub country: Option<String>,
}

fn required(label: &'static str, value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::Missing(label));
    }
    Ok(value.to_string())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

impl CheckoutForm {
    /// Validate the form and build the order-creation request, priced with
    /// `quote`. Fields are checked in form order; the first problem wins.
    ///
    /// # Errors
    ///
    /// Returns [`FormError`] naming the first blank or malformed field.
    pub fn to_order_request(
        &self,
        default_country: &str,
        quote: &ShippingQuote,
    ) -> Result<CreateOrderRequest, FormError> {
        let first_name = required("First name", &self.first_name)?;
        let last_name = required("Last name", &self.last_name)?;
        let email = match Email::parse(&self.email) {
            Ok(email) => email,
            Err(EmailError::Empty) => return Err(FormError::Missing("Email")),
            Err(e) => return Err(FormError::InvalidEmail(e)),
        };
        let phone = required("Phone", &self.phone)?;

        let shipping_address = ShippingAddress {
            address_line1: required("Street address", &self.address)?,
            address_line2: optional(self.apartment.as_deref()),
            city: required("City", &self.city)?,
            state: required("State", &self.state)?,
            postal_code: required("Postal code", &self.postal_code)?,
            country: optional(self.country.as_deref())
                .unwrap_or_else(|| default_country.to_string()),
        };

        let mut request = CreateOrderRequest {
            first_name,
            last_name,
            email,
            phone,
            shipping_address,
            subtotal: rust_decimal::Decimal::ZERO,
            shipping_cost: rust_decimal::Decimal::ZERO,
            total_amount: rust_decimal::Decimal::ZERO,
        };
        request.set_totals(quote);
        Ok(request)
    }
}
