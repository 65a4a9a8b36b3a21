//! Checkout command.
//!
//! Places an order for the current server cart and writes the payment
//! gateway handoff page. Opening that page in a browser posts the signed
//! fields to the gateway.

use std::path::Path;

use shopfront_client::AppState;
use shopfront_client::checkout::CheckoutForm;

use super::cart::sync;
use super::{CommandError, emit, money};

/// Submit checkout and write the gateway redirect page to `output`.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded, checkout fails, or the
/// page cannot be written.
pub async fn run(state: &AppState, form: &CheckoutForm, output: &Path) -> Result<(), CommandError> {
    let store = state.open_cart();
    sync(store.fetch_cart().await)?;

    let cart = store.cart();
    let checkout = state.checkout();
    let quote = checkout.quote(&cart);
    emit(&format!("Subtotal: {}", money(quote.subtotal)));
    emit(&format!(
        "Shipping: {}",
        if quote.is_free_shipping() {
            "Free".to_string()
        } else {
            money(quote.shipping)
        }
    ));
    emit(&format!("Total:    {}", money(quote.total)));

    let redirect = checkout.submit(&cart, form).await?;
    std::fs::write(output, redirect.render_html()?)?;

    tracing::info!(target_url = %redirect.target_url, "Payment redirect ready");
    emit(&format!(
        "\nOpen {} in a browser to continue to payment at {}",
        output.display(),
        redirect.target_url
    ));
    Ok(())
}
