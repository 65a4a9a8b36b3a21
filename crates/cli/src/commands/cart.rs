//! Cart commands.
//!
//! Every command loads the server cart first so the store starts from the
//! backend's view, then applies the requested change.

use shopfront_client::AppState;
use shopfront_client::api::ApiClient;
use shopfront_client::cart::{CartStore, SyncOutcome};
use shopfront_core::{CartItem, ProductId};

use super::{CommandError, emit, money};

/// What to do with the cart.
#[derive(Debug, Clone)]
pub enum CartAction {
    Show,
    Add { product_id: String, quantity: u32 },
    Update { product_id: String, quantity: i64 },
    Remove { product_id: String },
    Clear,
}

/// Run a cart action and print the resulting cart.
///
/// # Errors
///
/// Returns an error if the cart cannot be loaded, the product to add cannot
/// be found, or the change was only applied locally.
pub async fn run(state: &AppState, action: CartAction) -> Result<(), CommandError> {
    let store = state.open_cart();
    sync(store.fetch_cart().await)?;

    let outcome = match action {
        CartAction::Show => SyncOutcome::Synced,
        CartAction::Add {
            product_id,
            quantity,
        } => {
            let product = state.api().get_product(&ProductId::new(product_id)).await?;
            store.add_to_cart(&product, quantity).await
        }
        CartAction::Update {
            product_id,
            quantity,
        } => {
            store
                .update_quantity(&ProductId::new(product_id), quantity)
                .await
        }
        CartAction::Remove { product_id } => {
            store.remove_from_cart(&ProductId::new(product_id)).await
        }
        CartAction::Clear => store.clear_cart().await,
    };

    print_cart(&store);
    sync(outcome)
}

/// Treat a cart change that did not reach the backend as a failure.
pub fn sync(outcome: SyncOutcome) -> Result<(), CommandError> {
    match outcome {
        SyncOutcome::Synced | SyncOutcome::Superseded { error: None } => Ok(()),
        SyncOutcome::LocalOnly { error }
        | SyncOutcome::Superseded {
            error: Some(error),
        } => Err(CommandError::CartSync(error)),
    }
}

fn print_cart(store: &CartStore<ApiClient>) {
    let items = store.items();
    if items.is_empty() {
        emit("Your cart is empty.");
        return;
    }

    for item in &items {
        emit(&item_line(item));
    }
    emit(&format!(
        "\n{} item(s), total {}",
        store.total_items(),
        money(store.total_price())
    ));
}

fn item_line(item: &CartItem) -> String {
    format!(
        "{:>3} x {:<32} {:>10}",
        item.quantity,
        item.product.name,
        money(item.line_total())
    )
}
