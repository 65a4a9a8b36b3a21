//! Wire types for the storefront REST API.
//!
//! These mirror the JSON the backend sends and accepts. Domain types from
//! `shopfront-core` are used directly where the shapes agree.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shopfront_core::{
    DocumentKeys, Email, MissingDocumentId, Order, OrderId, Price, Product, ProductId,
    ShippingAddress, ShippingQuote,
};
use url::Url;

// =============================================================================
// Auth
// =============================================================================

/// Body of `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

/// Body of `POST /api/auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub user_id: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic acknowledgement carrying an optional message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// Pagination block of a product listing.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default, alias = "pages")]
    pub total_pages: Option<u32>,
}

/// Body of `GET /api/products`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListResponse {
    #[serde(default)]
    pub data: Vec<Product>,
    #[serde(default)]
    pub pagination: Pagination,
}

// =============================================================================
// Cart
// =============================================================================

/// Body of `POST /api/cart` and `PUT /api/cart`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest<'a> {
    pub product_id: &'a ProductId,
    pub quantity: u32,
}

/// Product reference on a server cart line.
///
/// Depending on the endpoint the backend populates the product document,
/// sends a partial document, or only the product id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "ProductRefWire")]
pub enum ProductRef {
    Populated(Product),
    Partial { id: ProductId },
    Id(ProductId),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProductRefWire {
    Populated(Product),
    Partial(DocumentKeys<ProductId>),
    Id(ProductId),
}

impl TryFrom<ProductRefWire> for ProductRef {
    type Error = MissingDocumentId;

    fn try_from(wire: ProductRefWire) -> Result<Self, Self::Error> {
        Ok(match wire {
            ProductRefWire::Populated(product) => Self::Populated(product),
            ProductRefWire::Partial(keys) => Self::Partial { id: keys.require()? },
            ProductRefWire::Id(id) => Self::Id(id),
        })
    }
}

impl ProductRef {
    /// The referenced product id.
    #[must_use]
    pub const fn id(&self) -> &ProductId {
        match self {
            Self::Populated(product) => &product.id,
            Self::Partial { id } | Self::Id(id) => id,
        }
    }
}

/// A cart line as returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteCartLine {
    pub product: ProductRef,
    pub quantity: u32,
}

/// Server-side cart snapshot. A body without `items` is an empty cart.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RemoteCart {
    #[serde(default)]
    pub items: Vec<RemoteCartLine>,
}

// =============================================================================
// Orders & Payment
// =============================================================================

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub shipping_address: ShippingAddress,
    #[serde(with = "rust_decimal::serde::float")]
    pub subtotal: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub shipping_cost: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
}

impl CreateOrderRequest {
    /// Copy the totals of a shipping quote into the request.
    pub fn set_totals(&mut self, quote: &ShippingQuote) {
        self.subtotal = quote.subtotal.amount();
        self.shipping_cost = quote.shipping.amount();
        self.total_amount = quote.total.amount();
    }

    /// Order total in the store currency.
    ///
    /// # Errors
    ///
    /// Fails only if the total was set to a negative amount.
    pub fn total(&self) -> Result<Price, shopfront_core::PriceError> {
        Price::new(self.total_amount)
    }
}

/// Order payload: either `{order: {...}}` or the order document itself.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OrderResponse {
    Keyed { order: Order },
    Bare(Order),
}

impl OrderResponse {
    /// The order, whichever way it was sent.
    #[must_use]
    pub fn into_order(self) -> Order {
        match self {
            Self::Keyed { order } | Self::Bare(order) => order,
        }
    }
}

/// Body of `POST /api/payment/payu`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest<'a> {
    pub order_id: &'a OrderId,
}

/// Payment gateway handoff returned by the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInitiation {
    /// Gateway endpoint the browser must POST to.
    #[serde(alias = "payuURL")]
    pub payu_url: Url,
    /// Signed form parameters, passed through untouched.
    #[serde(default)]
    pub params: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_cart_line_shapes() {
        let json = r#"{"items": [
            {"product": {"_id": "p1", "name": "Tee", "price": 20}, "quantity": 2},
            {"product": {"_id": "p2"}, "quantity": 1},
            {"product": "p3", "quantity": 4}
        ]}"#;

        let cart: RemoteCart = serde_json::from_str(json).unwrap();
        assert_eq!(cart.items.len(), 3);
        assert!(matches!(cart.items[0].product, ProductRef::Populated(_)));
        assert!(matches!(cart.items[1].product, ProductRef::Partial { .. }));
        assert!(matches!(cart.items[2].product, ProductRef::Id(_)));
        assert_eq!(cart.items[2].product.id().as_str(), "p3");
    }

    #[test]
    fn test_remote_cart_with_both_id_keys() {
        let json = r#"{"items": [
            {"product": {"_id": "p1", "id": "p1", "name": "Tee", "price": 20, "__v": 0}, "quantity": 2},
            {"product": {"_id": "p2", "id": "p2"}, "quantity": 1}
        ]}"#;

        let cart: RemoteCart = serde_json::from_str(json).unwrap();
        match &cart.items[0].product {
            ProductRef::Populated(product) => {
                assert_eq!(product.id.as_str(), "p1");
                assert_eq!(product.name, "Tee");
            }
            other => panic!("expected populated product, got {other:?}"),
        }
        assert_eq!(
            cart.items[1].product,
            ProductRef::Partial {
                id: ProductId::new("p2")
            }
        );
    }

    #[test]
    fn test_product_ref_without_any_id_is_rejected() {
        let json = r#"{"items": [{"product": {"quantity": 3}, "quantity": 1}]}"#;
        assert!(serde_json::from_str::<RemoteCart>(json).is_err());
    }

    #[test]
    fn test_cart_item_request_shape() {
        let id = ProductId::new("p1");
        let body = serde_json::to_value(CartItemRequest {
            product_id: &id,
            quantity: 2,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"productId": "p1", "quantity": 2}));
    }

    #[test]
    fn test_create_order_totals_are_numbers() {
        let mut request = CreateOrderRequest {
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            email: Email::parse("asha@example.com").unwrap(),
            phone: "9999999999".to_string(),
            shipping_address: ShippingAddress::default(),
            subtotal: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
            total_amount: Decimal::ZERO,
        };
        request.set_totals(&shopfront_core::ShippingPolicy::default().quote(Price::from_units(120)));

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(body["subtotal"], serde_json::json!(120.0));
        assert_eq!(body["shippingCost"], serde_json::json!(15.0));
        assert_eq!(body["totalAmount"], serde_json::json!(135.0));
        assert_eq!(body["firstName"], "Asha");
        assert_eq!(request.total().unwrap(), Price::from_units(135));
    }

    #[test]
    fn test_order_response_shapes() {
        let keyed: OrderResponse =
            crate::api::envelope::unwrap_body(r#"{"success": true, "order": {"_id": "o1"}}"#).unwrap();
        assert_eq!(keyed.into_order().id.as_str(), "o1");

        let wrapped: OrderResponse =
            crate::api::envelope::unwrap_body(r#"{"data": {"order": {"_id": "o2"}}}"#).unwrap();
        assert_eq!(wrapped.into_order().id.as_str(), "o2");

        let bare: OrderResponse =
            crate::api::envelope::unwrap_body(r#"{"_id": "o3", "status": "paid"}"#).unwrap();
        assert!(bare.into_order().status.is_paid());
    }

    #[test]
    fn test_payment_initiation() {
        let json = r#"{"payuUrl": "https://test.payu.in/_payment", "params": {"key": "k", "amount": 135, "hash": "abc"}}"#;
        let initiation: PaymentInitiation = serde_json::from_str(json).unwrap();
        assert_eq!(initiation.payu_url.host_str(), Some("test.payu.in"));
        assert_eq!(initiation.params.len(), 3);
    }
}
