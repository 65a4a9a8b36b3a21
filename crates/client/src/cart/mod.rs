//! Cart state store.
//!
//! [`CartStore`] holds the session's view of the cart and keeps it in step
//! with the backend:
//!
//! - **Server wins on success**: the returned snapshot replaces local items.
//! - **Client patch wins on failure**: the store applies the shopper's intent
//!   locally (add, remove, set quantity, clear) and records the error.
//!
//! Overlapping mutations are ordered by ticket. Each call takes the next
//! ticket when it starts; a completion whose ticket is older than the last
//! applied one is stale and never overwrites newer state.

mod reconcile;

pub use reconcile::reconcile;

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use serde::Serialize;
use shopfront_core::{Cart, CartItem, Price, Product, ProductId};
use tracing::{debug, instrument, warn};

use crate::api::ApiError;
use crate::api::types::RemoteCart;
use crate::error::{Trail, capture_api_error};

// =============================================================================
// Remote cart port
// =============================================================================

/// Cart operations on the backend. Every call needs a signed-in session.
///
/// Implemented by [`crate::api::ApiClient`]; tests substitute fakes.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// `GET /api/cart`
    async fn get_cart(&self) -> Result<RemoteCart, ApiError>;

    /// `POST /api/cart {productId, quantity}`
    async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Result<RemoteCart, ApiError>;

    /// `PUT /api/cart {productId, quantity}`
    async fn update_item(&self, product_id: &ProductId, quantity: u32)
    -> Result<RemoteCart, ApiError>;

    /// `DELETE /api/cart/item/:productId`
    async fn remove_item(&self, product_id: &ProductId) -> Result<RemoteCart, ApiError>;

    /// `DELETE /api/cart/clear`
    async fn clear_cart(&self) -> Result<RemoteCart, ApiError>;
}

// =============================================================================
// Store
// =============================================================================

/// How a cart operation ended up affecting the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The server snapshot was applied.
    Synced,
    /// The request failed; the local patch was applied.
    LocalOnly { error: String },
    /// A newer operation had already been applied, so this result was
    /// discarded. Failures still record their error.
    Superseded { error: Option<String> },
}

/// Read-only view of the store at one instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartItem>,
    pub total_items: u64,
    pub total_price: Price,
    pub loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    cart: Cart,
    error: Option<String>,
    /// Requests started but not yet completed.
    in_flight: usize,
    /// Last ticket handed out.
    issued: u64,
    /// Ticket of the most recent completion applied to `cart`.
    applied: u64,
}

fn write_state(state: &RwLock<StoreState>) -> RwLockWriteGuard<'_, StoreState> {
    state.write().unwrap_or_else(PoisonError::into_inner)
}

/// A started backend request, counted in `in_flight` until it settles.
///
/// A request whose future is dropped before completing still leaves the
/// count when this is dropped.
struct InFlight<'a> {
    state: &'a RwLock<StoreState>,
    ticket: u64,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(&mut self, state: &mut StoreState) {
        state.in_flight = state.in_flight.saturating_sub(1);
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(ticket = self.ticket, "Cart request dropped before completion");
            let mut state = write_state(self.state);
            state.in_flight = state.in_flight.saturating_sub(1);
        }
    }
}

/// A cart change requested by the shopper.
#[derive(Debug, Clone, Copy)]
enum Mutation<'a> {
    Fetch,
    Add { product: &'a Product, quantity: u32 },
    Remove { product_id: &'a ProductId },
    Update { product_id: &'a ProductId, quantity: u32 },
    Clear,
}

impl Mutation<'_> {
    const fn name(&self) -> &'static str {
        match self {
            Self::Fetch => "cart.fetch",
            Self::Add { .. } => "cart.add",
            Self::Remove { .. } => "cart.remove",
            Self::Update { .. } => "cart.update",
            Self::Clear => "cart.clear",
        }
    }

    /// Product the caller handed us, used to resolve id-only server lines.
    const fn hint(&self) -> Option<&Product> {
        match self {
            Self::Add { product, .. } => Some(*product),
            _ => None,
        }
    }

    /// Apply the shopper's intent locally.
    fn apply_locally(&self, cart: &mut Cart) {
        match *self {
            Self::Fetch => {}
            Self::Add { product, quantity } => cart.add(product.clone(), quantity),
            Self::Remove { product_id } => {
                cart.remove(product_id);
            }
            Self::Update {
                product_id,
                quantity,
            } => cart.set_quantity(product_id, quantity),
            Self::Clear => cart.clear(),
        }
    }
}

/// The session's cart, kept in sync with the backend through `C`.
///
/// Created when the session starts and dropped when it ends. Share it behind
/// an `Arc` when several tasks mutate the cart.
#[derive(Debug)]
pub struct CartStore<C> {
    api: C,
    state: RwLock<StoreState>,
}

impl<C: CartApi> CartStore<C> {
    /// Create a store with an empty cart.
    pub fn new(api: C) -> Self {
        Self {
            api,
            state: RwLock::new(StoreState::default()),
        }
    }

    /// The backend port this store talks to.
    pub const fn api(&self) -> &C {
        &self.api
    }

    fn read(&self) -> RwLockReadGuard<'_, StoreState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, StoreState> {
        write_state(&self.state)
    }

    // =========================================================================
    // Operations
    // =========================================================================

    /// Load the cart from the backend.
    #[instrument(skip(self))]
    pub async fn fetch_cart(&self) -> SyncOutcome {
        self.run(Mutation::Fetch).await
    }

    /// Add `quantity` of a product.
    ///
    /// Adding zero does nothing and sends nothing.
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn add_to_cart(&self, product: &Product, quantity: u32) -> SyncOutcome {
        if quantity == 0 {
            debug!("Ignoring add of zero items");
            return SyncOutcome::Synced;
        }
        self.run(Mutation::Add { product, quantity }).await
    }

    /// Remove a product. Removing a product that is not in the cart is
    /// harmless.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> SyncOutcome {
        self.run(Mutation::Remove { product_id }).await
    }

    /// Set the quantity of a product.
    ///
    /// A quantity of zero or less is a removal; a non-positive quantity is
    /// never sent to the backend.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(&self, product_id: &ProductId, quantity: i64) -> SyncOutcome {
        if quantity <= 0 {
            return self.remove_from_cart(product_id).await;
        }
        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        self.run(Mutation::Update {
            product_id,
            quantity,
        })
        .await
    }

    /// Empty the cart.
    #[instrument(skip(self))]
    pub async fn clear_cart(&self) -> SyncOutcome {
        self.run(Mutation::Clear).await
    }

    async fn run(&self, mutation: Mutation<'_>) -> SyncOutcome {
        let mut request = self.begin();

        let result = match mutation {
            Mutation::Fetch => self.api.get_cart().await,
            Mutation::Add { product, quantity } => self.api.add_item(&product.id, quantity).await,
            Mutation::Remove { product_id } => self.api.remove_item(product_id).await,
            Mutation::Update {
                product_id,
                quantity,
            } => self.api.update_item(product_id, quantity).await,
            Mutation::Clear => self.api.clear_cart().await,
        };

        self.complete(&mut request, mutation, result)
    }

    /// Mark a request as started and hand out its ticket.
    fn begin(&self) -> InFlight<'_> {
        let mut state = self.write();
        state.in_flight += 1;
        state.issued += 1;
        state.error = None;
        InFlight {
            state: &self.state,
            ticket: state.issued,
            settled: false,
        }
    }

    /// Apply a completed request to the store.
    fn complete(
        &self,
        request: &mut InFlight<'_>,
        mutation: Mutation<'_>,
        result: Result<RemoteCart, ApiError>,
    ) -> SyncOutcome {
        if let Err(err) = &result {
            warn!(
                operation = mutation.name(),
                error = %err,
                "Cart request failed"
            );
            capture_api_error(mutation.name(), err);
        }

        let ticket = request.ticket;
        let mut state = self.write();
        request.settle(&mut state);

        if ticket < state.applied {
            debug!(ticket, applied = state.applied, "Discarding stale cart response");
            let error = result.err().map(|err| err.user_message());
            if let Some(message) = &error {
                state.error = Some(message.clone());
            }
            return SyncOutcome::Superseded { error };
        }
        state.applied = ticket;

        match result {
            Ok(remote) => {
                state.cart = reconcile(remote, &state.cart, mutation.hint());
                Trail::Cart.mark("Cart synced", &[("operation", mutation.name())]);
                SyncOutcome::Synced
            }
            Err(err) => {
                let message = err.user_message();
                mutation.apply_locally(&mut state.cart);
                state.error = Some(message.clone());
                Trail::Cart.mark(
                    "Applied local cart patch",
                    &[("operation", mutation.name()), ("error", message.as_str())],
                );
                SyncOutcome::LocalOnly { error: message }
            }
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current items.
    pub fn items(&self) -> Vec<CartItem> {
        self.read().cart.items().to_vec()
    }

    /// Current cart.
    pub fn cart(&self) -> Cart {
        self.read().cart.clone()
    }

    /// Sum of item quantities.
    pub fn total_items(&self) -> u64 {
        self.read().cart.total_items()
    }

    /// Sum of `quantity × price`.
    pub fn total_price(&self) -> Price {
        self.read().cart.total_price()
    }

    /// `true` while any request is outstanding.
    pub fn loading(&self) -> bool {
        self.read().in_flight > 0
    }

    /// Message of the most recent failure since the last operation started.
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    /// Everything above, read under one lock.
    pub fn snapshot(&self) -> CartSnapshot {
        let state = self.read();
        CartSnapshot {
            items: state.cart.items().to_vec(),
            total_items: state.cart.total_items(),
            total_price: state.cart.total_price(),
            loading: state.in_flight > 0,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use shopfront_core::Category;
    use tokio::sync::oneshot;

    use super::*;
    use crate::api::types::{ProductRef, RemoteCartLine};

    type Reply = Result<RemoteCart, ApiError>;

    enum Scripted {
        Ready(Reply),
        Pending(oneshot::Receiver<Reply>),
    }

    /// Cart backend that replays scripted replies in call order.
    #[derive(Default)]
    struct FakeCartApi {
        calls: Mutex<Vec<String>>,
        replies: Mutex<VecDeque<Scripted>>,
    }

    impl FakeCartApi {
        fn reply(self, reply: Reply) -> Self {
            self.replies.lock().unwrap().push_back(Scripted::Ready(reply));
            self
        }

        fn pending(self, rx: oneshot::Receiver<Reply>) -> Self {
            self.replies.lock().unwrap().push_back(Scripted::Pending(rx));
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn respond(&self, call: String) -> Reply {
            let next = {
                self.calls.lock().unwrap().push(call);
                self.replies.lock().unwrap().pop_front()
            };
            match next {
                Some(Scripted::Ready(reply)) => reply,
                Some(Scripted::Pending(rx)) => rx.await.unwrap(),
                None => Err(ApiError::Api {
                    status: 503,
                    message: None,
                }),
            }
        }
    }

    #[async_trait]
    impl CartApi for FakeCartApi {
        async fn get_cart(&self) -> Reply {
            self.respond("get".to_string()).await
        }

        async fn add_item(&self, product_id: &ProductId, quantity: u32) -> Reply {
            self.respond(format!("add {product_id} {quantity}")).await
        }

        async fn update_item(&self, product_id: &ProductId, quantity: u32) -> Reply {
            self.respond(format!("update {product_id} {quantity}")).await
        }

        async fn remove_item(&self, product_id: &ProductId) -> Reply {
            self.respond(format!("remove {product_id}")).await
        }

        async fn clear_cart(&self) -> Reply {
            self.respond("clear".to_string()).await
        }
    }

    fn product(id: &str, price: u32) -> Product {
        Product {
            id: ProductId::new(id),
            name: format!("Product {id}"),
            price: Price::from_units(price),
            category: Category::Accessories,
            image: String::new(),
            description: String::new(),
            rating: 4.5,
            in_stock: true,
        }
    }

    fn remote(lines: &[(&Product, u32)]) -> RemoteCart {
        RemoteCart {
            items: lines
                .iter()
                .map(|(product, quantity)| RemoteCartLine {
                    product: ProductRef::Populated((*product).clone()),
                    quantity: *quantity,
                })
                .collect(),
        }
    }

    fn failure(message: &str) -> Reply {
        Err(ApiError::Api {
            status: 500,
            message: Some(message.to_string()),
        })
    }

    async fn wait_for_calls<C>(store: &CartStore<C>, count: usize, calls: impl Fn(&C) -> usize)
    where
        C: CartApi,
    {
        while calls(store.api()) < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_successful_mutations_keep_totals_consistent() {
        let tee = product("tee", 20);
        let tote = product("tote", 35);
        let api = FakeCartApi::default()
            .reply(Ok(remote(&[(&tee, 2)])))
            .reply(Ok(remote(&[(&tee, 2), (&tote, 1)])))
            .reply(Ok(remote(&[(&tee, 5), (&tote, 1)])))
            .reply(Ok(remote(&[(&tote, 1)])));
        let store = CartStore::new(api);

        let check = |store: &CartStore<FakeCartApi>| {
            let snapshot = store.snapshot();
            let quantities: u64 = snapshot.items.iter().map(|i| u64::from(i.quantity)).sum();
            let price: Price = snapshot.items.iter().map(CartItem::line_total).sum();
            assert_eq!(snapshot.total_items, quantities);
            assert_eq!(snapshot.total_price, price);
        };

        assert_eq!(store.add_to_cart(&tee, 2).await, SyncOutcome::Synced);
        check(&store);
        assert_eq!(store.add_to_cart(&tote, 1).await, SyncOutcome::Synced);
        check(&store);
        assert_eq!(
            store.update_quantity(&tee.id, 5).await,
            SyncOutcome::Synced
        );
        check(&store);
        assert_eq!(store.remove_from_cart(&tee.id).await, SyncOutcome::Synced);
        check(&store);

        assert_eq!(store.total_items(), 1);
        assert_eq!(store.total_price(), Price::from_units(35));
        assert!(!store.loading());
        assert_eq!(store.error(), None);
        assert_eq!(
            store.api().calls(),
            vec!["add tee 2", "add tote 1", "update tee 5", "remove tee"]
        );
    }

    #[tokio::test]
    async fn test_failed_add_increments_locally() {
        let tee = product("tee", 20);
        let api = FakeCartApi::default()
            .reply(Ok(remote(&[(&tee, 1)])))
            .reply(failure("Cart service unavailable"))
            .reply(Err(ApiError::Unauthorized("Not signed in".to_string())));
        let store = CartStore::new(api);

        store.fetch_cart().await;
        let outcome = store.add_to_cart(&tee, 2).await;
        assert_eq!(
            outcome,
            SyncOutcome::LocalOnly {
                error: "Cart service unavailable".to_string()
            }
        );
        assert_eq!(store.cart().get(&tee.id).unwrap().quantity, 3);
        assert_eq!(store.error().as_deref(), Some("Cart service unavailable"));

        let tote = product("tote", 35);
        store.add_to_cart(&tote, 2).await;
        assert_eq!(store.cart().get(&tote.id).unwrap().quantity, 2);
        assert_eq!(store.error().as_deref(), Some("Not signed in"));
        assert!(!store.loading());
    }

    #[tokio::test]
    async fn test_failed_clear_empties_cart() {
        let tee = product("tee", 20);
        let api = FakeCartApi::default().reply(Ok(remote(&[(&tee, 4)])));
        let store = CartStore::new(api);

        store.fetch_cart().await;
        assert_eq!(store.total_items(), 4);

        let outcome = store.clear_cart().await;
        assert!(matches!(outcome, SyncOutcome::LocalOnly { .. }));
        assert!(store.items().is_empty());
        assert_eq!(store.error().as_deref(), Some("Network error"));
    }

    #[tokio::test]
    async fn test_failed_update_and_fetch() {
        let tee = product("tee", 20);
        let api = FakeCartApi::default()
            .reply(Ok(remote(&[(&tee, 1)])))
            .reply(failure("Update failed"))
            .reply(failure("Fetch failed"));
        let store = CartStore::new(api);

        store.fetch_cart().await;
        store.update_quantity(&tee.id, 7).await;
        assert_eq!(store.cart().get(&tee.id).unwrap().quantity, 7);

        // A failed fetch has no intent to apply.
        store.fetch_cart().await;
        assert_eq!(store.total_items(), 7);
        assert_eq!(store.error().as_deref(), Some("Fetch failed"));
    }

    #[tokio::test]
    async fn test_non_positive_update_is_remove() {
        for quantity in [0, -1] {
            let tee = product("tee", 20);
            let tote = product("tote", 35);
            let api = FakeCartApi::default()
                .reply(Ok(remote(&[(&tee, 1), (&tote, 2)])))
                .reply(Ok(remote(&[(&tote, 2)])));
            let store = CartStore::new(api);
            store.fetch_cart().await;

            store.update_quantity(&tee.id, quantity).await;

            assert_eq!(store.api().calls(), vec!["get", "remove tee"]);
            assert!(store.cart().get(&tee.id).is_none());
            assert_eq!(store.total_items(), 2);
        }
    }

    #[tokio::test]
    async fn test_non_positive_update_matches_remove_on_failure() {
        let tee = product("tee", 20);
        let seed = || FakeCartApi::default().reply(Ok(remote(&[(&tee, 3)])));

        let by_update = CartStore::new(seed());
        by_update.fetch_cart().await;
        by_update.update_quantity(&tee.id, 0).await;

        let by_remove = CartStore::new(seed());
        by_remove.fetch_cart().await;
        by_remove.remove_from_cart(&tee.id).await;

        assert_eq!(by_update.snapshot(), by_remove.snapshot());
        assert!(by_update.items().is_empty());
    }

    #[tokio::test]
    async fn test_remove_absent_product_fails_gracefully() {
        let tee = product("tee", 20);
        let api = FakeCartApi::default()
            .reply(Ok(remote(&[(&tee, 1)])))
            .reply(failure("Item not in cart"));
        let store = CartStore::new(api);
        store.fetch_cart().await;

        let outcome = store.remove_from_cart(&ProductId::new("missing")).await;

        assert!(matches!(outcome, SyncOutcome::LocalOnly { .. }));
        assert_eq!(store.total_items(), 1);
        assert_eq!(store.error().as_deref(), Some("Item not in cart"));
    }

    #[tokio::test]
    async fn test_add_zero_sends_nothing() {
        let store = CartStore::new(FakeCartApi::default());
        store.add_to_cart(&product("tee", 20), 0).await;
        assert!(store.api().calls().is_empty());
        assert!(store.items().is_empty());
    }

    #[tokio::test]
    async fn test_next_operation_clears_error() {
        let tee = product("tee", 20);
        let api = FakeCartApi::default()
            .reply(failure("boom"))
            .reply(Ok(remote(&[(&tee, 1)])));
        let store = CartStore::new(api);

        store.fetch_cart().await;
        assert!(store.error().is_some());
        store.fetch_cart().await;
        assert_eq!(store.error(), None);
    }

    #[tokio::test]
    async fn test_out_of_order_success_does_not_overwrite_newer_state() {
        let tee = product("tee", 20);
        let tote = product("tote", 35);
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let api = FakeCartApi::default().pending(first_rx).pending(second_rx);
        let store = Arc::new(CartStore::new(api));
        let call_count = |api: &FakeCartApi| api.calls().len();

        let first = {
            let store = Arc::clone(&store);
            let tee = tee.clone();
            tokio::spawn(async move { store.add_to_cart(&tee, 1).await })
        };
        wait_for_calls(&store, 1, call_count).await;

        let second = {
            let store = Arc::clone(&store);
            let tote = tote.clone();
            tokio::spawn(async move { store.add_to_cart(&tote, 1).await })
        };
        wait_for_calls(&store, 2, call_count).await;
        assert!(store.loading());

        second_tx.send(Ok(remote(&[(&tee, 1), (&tote, 1)]))).unwrap();
        assert_eq!(second.await.unwrap(), SyncOutcome::Synced);
        assert!(store.loading());

        // The older response knows nothing about the tote.
        first_tx.send(Ok(remote(&[(&tee, 1)]))).unwrap();
        assert_eq!(
            first.await.unwrap(),
            SyncOutcome::Superseded { error: None }
        );

        assert!(!store.loading());
        assert_eq!(store.total_items(), 2);
        assert!(store.cart().get(&tote.id).is_some());
    }

    #[tokio::test]
    async fn test_stale_failure_records_error_without_patch() {
        let tee = product("tee", 20);
        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        let api = FakeCartApi::default().pending(first_rx).pending(second_rx);
        let store = Arc::new(CartStore::new(api));
        let call_count = |api: &FakeCartApi| api.calls().len();

        let first = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.clear_cart().await })
        };
        wait_for_calls(&store, 1, call_count).await;

        let second = {
            let store = Arc::clone(&store);
            let tee = tee.clone();
            tokio::spawn(async move { store.add_to_cart(&tee, 3).await })
        };
        wait_for_calls(&store, 2, call_count).await;

        second_tx.send(Ok(remote(&[(&tee, 3)]))).unwrap();
        second.await.unwrap();

        first_tx.send(failure("Clear failed")).unwrap();
        assert_eq!(
            first.await.unwrap(),
            SyncOutcome::Superseded {
                error: Some("Clear failed".to_string())
            }
        );

        // The stale clear must not wipe the newer server state.
        assert_eq!(store.total_items(), 3);
        assert_eq!(store.error().as_deref(), Some("Clear failed"));
    }

    #[tokio::test]
    async fn test_dropped_request_stops_loading() {
        let tee = product("tee", 20);
        let (_tx, rx) = oneshot::channel();
        let api = FakeCartApi::default()
            .pending(rx)
            .reply(Ok(remote(&[(&tee, 2)])));
        let store = Arc::new(CartStore::new(api));

        let dropped = {
            let store = Arc::clone(&store);
            let tee = tee.clone();
            tokio::spawn(async move { store.add_to_cart(&tee, 1).await })
        };
        wait_for_calls(&store, 1, |api: &FakeCartApi| api.calls().len()).await;
        assert!(store.loading());

        dropped.abort();
        assert!(dropped.await.unwrap_err().is_cancelled());
        assert!(!store.loading());
        assert_eq!(store.total_items(), 0);

        assert_eq!(store.add_to_cart(&tee, 2).await, SyncOutcome::Synced);
        assert!(!store.loading());
        assert_eq!(store.total_items(), 2);
    }
}
