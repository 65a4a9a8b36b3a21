//! Cache types for catalog responses.

use shopfront_core::{CategoryFilter, Product, ProductId};

use super::catalog::ProductPage;

/// Cache key for products and product listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products {
        page: u32,
        limit: u32,
        category: CategoryFilter,
    },
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductPage),
}
