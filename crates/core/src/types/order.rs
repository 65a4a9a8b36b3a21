//! Orders created at checkout and owned by the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::{DocumentKeys, MissingDocumentId, OrderId, OrderLineId, ProductId};
use super::price::Price;
use super::status::OrderStatus;

/// Shipping address attached to an order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
}

/// Product reference on an order line.
///
/// The backend either populates the product document or sends its id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged, from = "OrderProductWire")]
pub enum OrderProduct {
    Details {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<ProductId>,
        name: String,
    },
    Reference(ProductId),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrderProductWire {
    Details {
        #[serde(flatten)]
        keys: DocumentKeys<ProductId>,
        name: String,
    },
    Reference(ProductId),
}

impl From<OrderProductWire> for OrderProduct {
    fn from(wire: OrderProductWire) -> Self {
        match wire {
            OrderProductWire::Details { keys, name } => Self::Details {
                id: keys.into_id(),
                name,
            },
            OrderProductWire::Reference(id) => Self::Reference(id),
        }
    }
}

impl OrderProduct {
    /// Display name: the product name, or its id when not populated.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Details { name, .. } => name,
            Self::Reference(id) => id.as_str(),
        }
    }
}

/// A purchased line on an order, priced at order time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "OrderLineDocument")]
pub struct OrderLine {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderLineId>,
    pub product: OrderProduct,
    pub price: Price,
    pub quantity: u32,
}

#[derive(Deserialize)]
struct OrderLineDocument {
    #[serde(flatten)]
    keys: DocumentKeys<OrderLineId>,
    product: OrderProduct,
    price: Price,
    quantity: u32,
}

impl From<OrderLineDocument> for OrderLine {
    fn from(doc: OrderLineDocument) -> Self {
        Self {
            id: doc.keys.into_id(),
            product: doc.product,
            price: doc.price,
            quantity: doc.quantity,
        }
    }
}

impl OrderLine {
    /// `price × quantity` for this line.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// An order as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "OrderDocument")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderLine>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub shipping_address: ShippingAddress,
    pub status: OrderStatus,
    pub total_amount: Price,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderDocument {
    #[serde(flatten)]
    keys: DocumentKeys<OrderId>,
    #[serde(default)]
    items: Vec<OrderLine>,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    last_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    shipping_address: ShippingAddress,
    #[serde(default)]
    status: OrderStatus,
    #[serde(default)]
    total_amount: Price,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl TryFrom<OrderDocument> for Order {
    type Error = MissingDocumentId;

    fn try_from(doc: OrderDocument) -> Result<Self, Self::Error> {
        Ok(Self {
            id: doc.keys.require()?,
            items: doc.items,
            first_name: doc.first_name,
            last_name: doc.last_name,
            email: doc.email,
            phone: doc.phone,
            shipping_address: doc.shipping_address,
            status: doc.status,
            total_amount: doc.total_amount,
            created_at: doc.created_at,
        })
    }
}

impl Order {
    /// Customer name as shown on the order.
    #[must_use]
    pub fn customer_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }

    /// Sum of line totals (excludes shipping).
    #[must_use]
    pub fn items_total(&self) -> Price {
        self.items.iter().map(OrderLine::line_total).sum()
    }
}
