//! Order commands.

use std::path::PathBuf;

use shopfront_client::AppState;
use shopfront_client::orders::OrderView;
use shopfront_core::OrderId;

use super::{CommandError, emit};

/// Print an order's details.
///
/// A missing or unreadable order prints a not-found notice rather than
/// failing.
///
/// # Errors
///
/// Returns an error if rendering fails.
pub async fn show(state: &AppState, id: &str) -> Result<(), CommandError> {
    let view = state.orders().view(&OrderId::new(id)).await;
    if let OrderView::NotFound { order_id } = &view {
        tracing::warn!(order_id = %order_id, "Order not found");
    }
    emit(view.render_text()?.trim_end());
    Ok(())
}

/// Download an order's invoice to `output`, or to the default invoice file
/// name in the working directory.
///
/// # Errors
///
/// Returns an error if the download fails or the file cannot be written.
pub async fn invoice(
    state: &AppState,
    id: &str,
    output: Option<PathBuf>,
) -> Result<(), CommandError> {
    let order_id = OrderId::new(id);
    let invoice = state.orders().download_invoice(&order_id).await?;

    let path = output.unwrap_or_else(|| PathBuf::from(&invoice.file_name));
    std::fs::write(&path, &invoice.bytes)?;

    tracing::info!(
        bytes = invoice.bytes.len(),
        content_type = invoice.content_type.as_deref().unwrap_or("unknown"),
        "Invoice saved"
    );
    emit(&format!("Saved invoice to {}", path.display()));
    Ok(())
}
