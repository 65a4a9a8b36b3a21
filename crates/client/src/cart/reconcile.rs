//! Turning a server cart snapshot into a local [`Cart`].

use shopfront_core::{Cart, CartItem, Product};
use tracing::warn;

use crate::api::types::{ProductRef, RemoteCart};

/// Build the local cart from a server snapshot. The server wins.
///
/// Lines whose product is only referenced by id are resolved against the
/// cart the client already holds, then against `hint` (the product being
/// added). Lines that cannot be resolved are dropped, since the client has
/// nothing to show or price them with.
pub fn reconcile(remote: RemoteCart, known: &Cart, hint: Option<&Product>) -> Cart {
    let items = remote.items.into_iter().filter_map(|line| {
        let product = match line.product {
            ProductRef::Populated(product) => product,
            reference => {
                let id = reference.id();
                let resolved = known
                    .get(id)
                    .map(|item| item.product.clone())
                    .or_else(|| hint.filter(|product| &product.id == id).cloned());
                let Some(product) = resolved else {
                    warn!(product_id = %id, "Dropping cart line for unknown product");
                    return None;
                };
                product
            }
        };
        Some(CartItem {
            product,
            quantity: line.quantity,
        })
    });

    Cart::from_items(items)
}
