//! Catalog browsing commands.

use shopfront_client::AppState;
use shopfront_client::api::ProductQuery;
use shopfront_core::{CategoryFilter, Product, ProductId};

use super::{CommandError, emit, money};

/// List one page of the catalog.
///
/// # Errors
///
/// Returns an error if the listing cannot be fetched.
pub async fn list(
    state: &AppState,
    page: u32,
    limit: u32,
    category: CategoryFilter,
    search: Option<String>,
) -> Result<(), CommandError> {
    let query = ProductQuery {
        page,
        limit,
        category,
        search,
    };
    let listing = state.api().list_products(&query).await?;

    if listing.products.is_empty() {
        emit("No products found.");
        return Ok(());
    }

    for product in &listing.products {
        emit(&summary_line(product));
    }
    emit(&format!(
        "\nPage {} of {} ({} products)",
        listing.page,
        listing.total_pages().max(1),
        listing.total
    ));
    Ok(())
}

/// Show one product.
///
/// # Errors
///
/// Returns an error if the product cannot be fetched.
pub async fn show(state: &AppState, id: &str) -> Result<(), CommandError> {
    let product = state.api().get_product(&ProductId::new(id)).await?;

    emit(&summary_line(&product));
    emit(&format!("Category: {}", product.category));
    emit(&format!("Rating:   {:.1}", product.rating));
    if !product.image.is_empty() {
        emit(&format!("Image:    {}", product.image));
    }
    if !product.description.is_empty() {
        emit(&format!("\n{}", product.description));
    }
    Ok(())
}

fn summary_line(product: &Product) -> String {
    let stock = if product.in_stock { "" } else { "  (out of stock)" };
    format!(
        "{:<26} {:<32} {:>10}{stock}",
        product.id,
        product.name,
        money(product.price)
    )
}
