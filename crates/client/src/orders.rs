//! Read-only order details.
//!
//! Any failure to load an order degrades to [`OrderView::NotFound`]; the
//! viewer never retries.

use askama::Template;
use async_trait::async_trait;
use shopfront_core::{Order, OrderId};
use tracing::{instrument, warn};

use crate::api::ApiError;
use crate::error::capture_api_error;
use crate::filters;

/// Order lookup and invoice download on the backend.
#[async_trait]
pub trait OrderApi: Send + Sync {
    /// `GET /api/orders/:orderId`
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError>;

    /// `GET /api/orders/invoice/:orderId`
    async fn download_invoice(&self, order_id: &OrderId) -> Result<Invoice, ApiError>;
}

/// A downloaded invoice document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    /// Suggested file name.
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl Invoice {
    /// Default file name for an order's invoice.
    #[must_use]
    pub fn default_file_name(order_id: &OrderId) -> String {
        format!("invoice-{order_id}.pdf")
    }
}

/// Result of looking up an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderView {
    Found(Box<Order>),
    NotFound { order_id: OrderId },
}

#[derive(Template)]
#[template(path = "order_detail.txt")]
struct OrderDetailText<'a> {
    order: &'a Order,
    placed: String,
    address_lines: Vec<&'a str>,
}

impl OrderView {
    /// Render a plain-text summary of the order.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_text(&self) -> askama::Result<String> {
        match self {
            Self::Found(order) => {
                let address = &order.shipping_address;
                let locality = [address.city.as_str(), address.state.as_str(), address.postal_code.as_str()];
                let address_lines = std::iter::once(address.address_line1.as_str())
                    .chain(address.address_line2.as_deref())
                    .chain(locality)
                    .chain(std::iter::once(address.country.as_str()))
                    .filter(|line| !line.trim().is_empty())
                    .collect();

                OrderDetailText {
                    order,
                    placed: order.created_at.map_or_else(
                        || "-".to_string(),
                        |at| at.format("%d %b %Y, %H:%M UTC").to_string(),
                    ),
                    address_lines,
                }
                .render()
            }
            Self::NotFound { order_id } => Ok(format!("Order {order_id} not found.\n")),
        }
    }
}

/// Fetches orders for display.
#[derive(Debug)]
pub struct OrderViewer<O> {
    api: O,
}

impl<O: OrderApi> OrderViewer<O> {
    pub const fn new(api: O) -> Self {
        Self { api }
    }

    /// Look up an order.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn view(&self, order_id: &OrderId) -> OrderView {
        match self.api.get_order(order_id).await {
            Ok(order) => OrderView::Found(Box::new(order)),
            Err(err) => {
                warn!(error = %err, "Order lookup failed");
                if !err.is_not_found() {
                    capture_api_error("orders.view", &err);
                }
                OrderView::NotFound {
                    order_id: order_id.clone(),
                }
            }
        }
    }

    /// Download the invoice PDF for an order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend refuses or the request fails.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn download_invoice(&self, order_id: &OrderId) -> Result<Invoice, ApiError> {
        self.api.download_invoice(order_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct FakeOrderApi;

    #[async_trait]
    impl OrderApi for FakeOrderApi {
        async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
            match order_id.as_str() {
                "ord_1" => Ok(serde_json::from_str(
                    r#"{
                        "_id": "ord_1",
                        "createdAt": "2024-03-05T10:30:00Z",
                        "items": [
                            {"_id": "l1", "product": {"_id": "p1", "name": "Linen Shirt"}, "price": 60, "quantity": 2}
                        ],
                        "status": "paid",
                        "totalAmount": 135,
                        "firstName": "Asha",
                        "lastName": "Rao",
                        "phone": "9999999999",
                        "shippingAddress": {
                            "addressLine1": "12 MG Road",
                            "city": "Bengaluru",
                            "state": "KA",
                            "postalCode": "560001",
                            "country": "India"
                        }
                    }"#,
                )
                .unwrap()),
                "ord_down" => Err(ApiError::Api {
                    status: 500,
                    message: None,
                }),
                _ => Err(ApiError::NotFound("Order not found".to_string())),
            }
        }

        async fn download_invoice(&self, order_id: &OrderId) -> Result<Invoice, ApiError> {
            Ok(Invoice {
                file_name: Invoice::default_file_name(order_id),
                content_type: Some("application/pdf".to_string()),
                bytes: b"%PDF-1.4".to_vec(),
            })
        }
    }

    #[tokio::test]
    async fn test_found_order_renders_summary() {
        let viewer = OrderViewer::new(FakeOrderApi);

        let view = viewer.view(&OrderId::new("ord_1")).await;
        assert!(matches!(view, OrderView::Found(_)));

        let text = view.render_text().unwrap();
        assert!(text.contains("Order #ord_1"));
        assert!(text.contains("05 Mar 2024"));
        assert!(text.contains("Asha Rao"));
        assert!(text.contains("2 x Linen Shirt"));
        assert!(text.contains("₹120.00"));
        assert!(text.contains("₹135.00"));
        assert!(text.contains("12 MG Road"));
        assert!(text.contains("560001"));
    }

    #[tokio::test]
    async fn test_failures_degrade_to_not_found() {
        let viewer = OrderViewer::new(FakeOrderApi);

        for id in ["missing", "ord_down"] {
            let view = viewer.view(&OrderId::new(id)).await;
            assert_eq!(
                view,
                OrderView::NotFound {
                    order_id: OrderId::new(id)
                }
            );
            assert_eq!(view.render_text().unwrap(), format!("Order {id} not found.\n"));
        }
    }

    #[tokio::test]
    async fn test_download_invoice() {
        let viewer = OrderViewer::new(FakeOrderApi);
        let invoice = viewer.download_invoice(&OrderId::new("ord_1")).await.unwrap();
        assert_eq!(invoice.file_name, "invoice-ord_1.pdf");
        assert!(invoice.bytes.starts_with(b"%PDF"));
    }
}
