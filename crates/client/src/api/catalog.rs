//! Catalog endpoints: product listing and product detail.

use reqwest::Method;
use serde_json::Value;
use shopfront_core::{CategoryFilter, Product, ProductId};
use tracing::{debug, instrument};

use super::cache::{CacheKey, CacheValue};
use super::types::ProductListResponse;
use super::{ApiClient, ApiError, Auth};

/// Products shown per catalog page.
pub const PRODUCTS_PER_PAGE: u32 = 8;

/// Parameters of a catalog listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    pub category: CategoryFilter,
    /// Free-text search; blank means no search.
    pub search: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: PRODUCTS_PER_PAGE,
            category: CategoryFilter::All,
            search: None,
        }
    }
}

impl ProductQuery {
    /// Search term with surrounding whitespace removed, if any remains.
    fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// One page of catalog results.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    pub products: Vec<Product>,
    /// Total number of matching products across all pages.
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl ProductPage {
    /// Number of pages needed for `total` products.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.limit))
    }
}

impl ApiClient {
    /// List catalog products.
    ///
    /// Listings without a search term are cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page, category = ?query.category))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let page = query.page.max(1);
        let limit = query.limit.max(1);
        let search = query.search_term();

        let cache_key = CacheKey::Products {
            page,
            limit,
            category: query.category,
        };
        if search.is_none()
            && let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await
        {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let mut url = self.endpoint(&["api", "products"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("page", &page.to_string())
                .append_pair("limit", &limit.to_string());
            if let Some(category) = query.category.category() {
                pairs.append_pair("category", category.as_str());
            }
            if let Some(search) = search {
                pairs.append_pair("search", search);
            }
        }

        let body = self.send(self.request(Method::GET, url, Auth::Public)?).await?;
        let listing = parse_listing(&body).map_err(|e| {
            tracing::error!(error = %e, "Failed to parse product listing");
            ApiError::Parse(e)
        })?;

        let result = ProductPage {
            products: listing.data,
            total: listing.pagination.total,
            page,
            limit,
        };

        if search.is_none() {
            self.inner
                .cache
                .insert(cache_key, CacheValue::Products(result.clone()))
                .await;
        }

        Ok(result)
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the backend does not know the product,
    /// or another error if the request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id.clone());

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&["api", "products", id.as_str()])?;
        let product: Product = self
            .execute(self.request(Method::GET, url, Auth::Public)?)
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Drop a cached product.
    pub async fn invalidate_product(&self, id: &ProductId) {
        self.inner
            .cache
            .invalidate(&CacheKey::Product(id.clone()))
            .await;
    }

    /// Drop every cached catalog response.
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
    }
}

/// Parse a listing body, which is `{data: [...], pagination}` either bare or
/// wrapped in one more `data` object.
fn parse_listing(body: &str) -> Result<ProductListResponse, serde_json::Error> {
    let mut value: Value = serde_json::from_str(body)?;
    if value.get("data").is_some_and(Value::is_object) {
        value = value["data"].take();
    }
    serde_json::from_value(value)
}
