//! Checkout orchestration.
//!
//! Turns a cart into a backend order and hands the shopper off to the payment
//! gateway:
//!
//! ```text
//! FormEditing --submit--> Submitting --order + payment ok--> Redirecting
//!      ^                      |
//!      +------- failure ------+
//! ```
//!
//! `Redirecting` is terminal; the browser takes over from there.

mod form;
mod redirect;

pub use form::{CheckoutForm, FormError};
pub use redirect::{ExternalRedirect, FormField};

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use shopfront_core::{Cart, Order, OrderId, ShippingPolicy, ShippingQuote};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

use crate::api::ApiError;
use crate::api::types::{CreateOrderRequest, PaymentInitiation};
use crate::error::{Trail, capture_api_error};

// =============================================================================
// Ports
// =============================================================================

/// Order and payment operations on the backend.
#[async_trait]
pub trait CheckoutApi: Send + Sync {
    /// `POST /api/orders`
    async fn create_order(&self, request: &CreateOrderRequest) -> Result<Order, ApiError>;

    /// `POST /api/payment/payu {orderId}`
    async fn initiate_payment(&self, order_id: &OrderId) -> Result<PaymentInitiation, ApiError>;
}

// =============================================================================
// Errors
// =============================================================================

/// Reasons a checkout submission did not reach the payment gateway.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Your cart is empty")]
    EmptyCart,

    #[error("Checkout is already being submitted")]
    InProgress,

    #[error("Payment is already in progress")]
    AlreadyRedirected,

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("Could not create order: {0}")]
    OrderCreation(#[source] ApiError),

    #[error("Could not start payment for order {order_id}: {source}")]
    Payment { order_id: OrderId, source: ApiError },
}

impl CheckoutError {
    /// Message suitable for a toast or alert.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::OrderCreation(err) | Self::Payment { source: err, .. } => err.user_message(),
            other => other.to_string(),
        }
    }
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Where the checkout flow currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutPhase {
    #[default]
    FormEditing,
    Submitting,
    Redirecting(ExternalRedirect),
}

#[derive(Debug, Default)]
struct CheckoutState {
    phase: CheckoutPhase,
    last_error: Option<String>,
}

fn lock_state(state: &Mutex<CheckoutState>) -> MutexGuard<'_, CheckoutState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Returns a submission that never finished (its future was dropped) to
/// `FormEditing`. Completed submissions have already left `Submitting`.
struct SubmitGuard<'a>(&'a Mutex<CheckoutState>);

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock_state(self.0);
        if state.phase == CheckoutPhase::Submitting {
            warn!("Checkout submission dropped before completion");
            state.phase = CheckoutPhase::FormEditing;
        }
    }
}

/// Checkout flow for one session.
#[derive(Debug)]
pub struct Checkout<A> {
    api: A,
    shipping: ShippingPolicy,
    default_country: String,
    state: Mutex<CheckoutState>,
}

impl<A: CheckoutApi> Checkout<A> {
    /// Create a checkout in `FormEditing`.
    pub fn new(api: A, shipping: ShippingPolicy, default_country: impl Into<String>) -> Self {
        Self {
            api,
            shipping,
            default_country: default_country.into(),
            state: Mutex::new(CheckoutState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CheckoutState> {
        lock_state(&self.state)
    }

    /// Current phase.
    pub fn phase(&self) -> CheckoutPhase {
        self.lock().phase.clone()
    }

    /// Message of the last failed submission, cleared by the next submit.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    /// Subtotal, shipping and total for a cart.
    pub fn quote(&self, cart: &Cart) -> ShippingQuote {
        self.shipping.quote(cart.total_price())
    }

    /// Submit the form: create the order, then start payment.
    ///
    /// An empty cart is rejected before anything is sent. On failure the
    /// flow returns to `FormEditing` and the cart is left untouched. The same
    /// happens if the returned future is dropped mid-flight.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError`] describing why no redirect was produced.
    #[instrument(skip(self, cart, form), fields(items = cart.items().len()))]
    pub async fn submit(
        &self,
        cart: &Cart,
        form: &CheckoutForm,
    ) -> Result<ExternalRedirect, CheckoutError> {
        let request = {
            let mut state = self.lock();
            match state.phase {
                CheckoutPhase::FormEditing => {}
                CheckoutPhase::Submitting => return Err(CheckoutError::InProgress),
                CheckoutPhase::Redirecting(_) => return Err(CheckoutError::AlreadyRedirected),
            }

            let prepared = if cart.is_empty() {
                Err(CheckoutError::EmptyCart)
            } else {
                form.to_order_request(&self.default_country, &self.quote(cart))
                    .map_err(CheckoutError::from)
            };
            match prepared {
                Ok(request) => {
                    state.phase = CheckoutPhase::Submitting;
                    state.last_error = None;
                    request
                }
                Err(err) => {
                    state.last_error = Some(err.user_message());
                    return Err(err);
                }
            }
        };

        let _submitting = SubmitGuard(&self.state);
        Trail::Checkout.mark("Submitting order", &[]);

        match self.place_order(&request).await {
            Ok(redirect) => {
                self.lock().phase = CheckoutPhase::Redirecting(redirect.clone());
                Ok(redirect)
            }
            Err(err) => {
                error!(error = %err, "Checkout failed");
                match &err {
                    CheckoutError::OrderCreation(source) => {
                        capture_api_error("checkout.create_order", source);
                    }
                    CheckoutError::Payment { source, .. } => {
                        capture_api_error("checkout.initiate_payment", source);
                    }
                    _ => {}
                }

                let mut state = self.lock();
                state.phase = CheckoutPhase::FormEditing;
                state.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    async fn place_order(
        &self,
        request: &CreateOrderRequest,
    ) -> Result<ExternalRedirect, CheckoutError> {
        let order = self
            .api
            .create_order(request)
            .await
            .map_err(CheckoutError::OrderCreation)?;
        info!(order_id = %order.id, total = %request.total_amount, "Order created");
        Trail::Checkout.mark("Order created", &[("order_id", order.id.as_str())]);

        let payment = self
            .api
            .initiate_payment(&order.id)
            .await
            .map_err(|source| CheckoutError::Payment {
                order_id: order.id.clone(),
                source,
            })?;
        info!(order_id = %order.id, "Payment initiated");

        Ok(ExternalRedirect::from_payment(payment))
    }
}
