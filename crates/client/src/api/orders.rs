//! Order, payment and invoice endpoints.

use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::CONTENT_TYPE;
use shopfront_core::{Order, OrderId};
use tracing::instrument;
use url::Url;

use super::types::{CreateOrderRequest, OrderResponse, PaymentInitiation, PaymentRequest};
use super::{ApiClient, ApiError, Auth};
use crate::checkout::CheckoutApi;
use crate::orders::{Invoice, OrderApi};

impl ApiClient {
    /// Navigation target for an order's invoice.
    ///
    /// The endpoint needs the bearer token, so it only works as a link in a
    /// context that sends one.
    ///
    /// # Errors
    ///
    /// Fails only if the base URL cannot take path segments.
    pub fn invoice_url(&self, order_id: &OrderId) -> Result<Url, ApiError> {
        self.endpoint(&["api", "orders", "invoice", order_id.as_str()])
    }
}

#[async_trait]
impl CheckoutApi for ApiClient {
    #[instrument(skip(self, request))]
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError> {
        let url = self.endpoint(&["api", "orders"])?;
        let response: OrderResponse = self
            .execute(self.request(Method::POST, url, Auth::Bearer)?.json(request))
            .await?;
        Ok(response.into_order())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn initiate_payment(&self, order_id: &OrderId) -> Result<PaymentInitiation, ApiError> {
        let url = self.endpoint(&["api", "payment", "payu"])?;
        self.execute(
            self.request(Method::POST, url, Auth::Bearer)?
                .json(&PaymentRequest { order_id }),
        )
        .await
    }
}

#[async_trait]
impl OrderApi for ApiClient {
    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn get_order(&self, order_id: &OrderId) -> Result<Order, ApiError> {
        let url = self.endpoint(&["api", "orders", order_id.as_str()])?;
        let response: OrderResponse = self
            .execute(self.request(Method::GET, url, Auth::Bearer)?)
            .await?;
        Ok(response.into_order())
    }

    #[instrument(skip(self), fields(order_id = %order_id))]
    async fn download_invoice(&self, order_id: &OrderId) -> Result<Invoice, ApiError> {
        let url = self.invoice_url(order_id)?;
        let response = self
            .dispatch(self.request(Method::GET, url, Auth::Bearer)?)
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?;

        Ok(Invoice {
            file_name: Invoice::default_file_name(order_id),
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}
