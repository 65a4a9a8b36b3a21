//! Cart endpoints.

use async_trait::async_trait;
use reqwest::Method;
use shopfront_core::ProductId;
use tracing::instrument;

use super::types::{CartItemRequest, RemoteCart};
use super::{ApiClient, ApiError, Auth, decode};
use crate::cart::CartApi;

#[async_trait]
impl CartApi for ApiClient {
    #[instrument(skip(self))]
    async fn get_cart(&self) -> Result<RemoteCart, ApiError> {
        let url = self.endpoint(&["api", "cart"])?;
        self.execute(self.request(Method::GET, url, Auth::Bearer)?)
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<RemoteCart, ApiError> {
        let url = self.endpoint(&["api", "cart"])?;
        let body = CartItemRequest {
            product_id,
            quantity,
        };
        self.execute(self.request(Method::POST, url, Auth::Bearer)?.json(&body))
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn update_item(
        &self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<RemoteCart, ApiError> {
        let url = self.endpoint(&["api", "cart"])?;
        let body = CartItemRequest {
            product_id,
            quantity,
        };
        self.execute(self.request(Method::PUT, url, Auth::Bearer)?.json(&body))
            .await
    }

    #[instrument(skip(self), fields(product_id = %product_id))]
    async fn remove_item(&self, product_id: &ProductId) -> Result<RemoteCart, ApiError> {
        let url = self.endpoint(&["api", "cart", "item", product_id.as_str()])?;
        self.execute(self.request(Method::DELETE, url, Auth::Bearer)?)
            .await
    }

    #[instrument(skip(self))]
    async fn clear_cart(&self) -> Result<RemoteCart, ApiError> {
        let url = self.endpoint(&["api", "cart", "clear"])?;
        let body = self
            .send(self.request(Method::DELETE, url, Auth::Bearer)?)
            .await?;

        // Some deployments answer a clear with no body at all.
        if body.trim().is_empty() {
            return Ok(RemoteCart::default());
        }
        decode(&body)
    }
}
