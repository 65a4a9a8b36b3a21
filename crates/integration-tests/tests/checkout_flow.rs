//! Checkout from a synced cart through to the payment redirect.

#![allow(clippy::unwrap_used)]

use shopfront_client::AppState;
use shopfront_client::checkout::{CheckoutError, CheckoutForm, CheckoutPhase};
use shopfront_core::Cart;
use shopfront_integration_tests::{MockBackend, PAYU_URL, TEST_EMAIL, TEST_PASSWORD};

fn form() -> CheckoutForm {
    CheckoutForm {
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        email: TEST_EMAIL.to_string(),
        phone: "9876543210".to_string(),
        address: "12 MG Road".to_string(),
        apartment: Some("Flat 4B".to_string()),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        postal_code: "560001".to_string(),
        country: None,
    }
}

async fn signed_in_cart(backend: &MockBackend) -> (AppState, Cart) {
    let state = backend.app_state();
    state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    let store = state.open_cart();
    store.fetch_cart().await;
    let cart = store.cart();
    (state, cart)
}

#[tokio::test]
async fn test_checkout_below_free_shipping_threshold() {
    let backend = MockBackend::start().await;
    backend.seed_cart(&[("p1", 2)]);
    let (state, cart) = signed_in_cart(&backend).await;

    let checkout = state.checkout();
    let redirect = checkout.submit(&cart, &form()).await.unwrap();

    let sent = &backend.order_requests()[0];
    assert_eq!(sent["subtotal"].as_f64(), Some(120.0));
    assert_eq!(sent["shippingCost"].as_f64(), Some(15.0));
    assert_eq!(sent["totalAmount"].as_f64(), Some(135.0));
    assert_eq!(sent["shippingAddress"]["addressLine2"], "Flat 4B");
    assert_eq!(sent["shippingAddress"]["country"], "India");

    assert_eq!(redirect.target_url.as_str(), PAYU_URL);
    assert_eq!(redirect.field("txnid"), Some("ord_1"));
    assert_eq!(redirect.field("udf1"), Some(""));
    assert!(matches!(checkout.phase(), CheckoutPhase::Redirecting(_)));
}

#[tokio::test]
async fn test_checkout_with_free_shipping() {
    let backend = MockBackend::start().await;
    backend.seed_cart(&[("p3", 1), ("p1", 1)]);
    let (state, cart) = signed_in_cart(&backend).await;

    let checkout = state.checkout();
    checkout.submit(&cart, &form()).await.unwrap();

    let sent = &backend.order_requests()[0];
    assert_eq!(sent["subtotal"].as_f64(), Some(210.0));
    assert_eq!(sent["shippingCost"].as_f64(), Some(0.0));
    assert_eq!(sent["totalAmount"].as_f64(), Some(210.0));
}

#[tokio::test]
async fn test_redirect_page_posts_every_field() {
    let backend = MockBackend::start().await;
    backend.seed_cart(&[("p2", 1)]);
    let (state, cart) = signed_in_cart(&backend).await;

    let redirect = state.checkout().submit(&cart, &form()).await.unwrap();
    let html = redirect.render_html().unwrap();

    assert!(html.contains(r#"method="post""#));
    assert!(html.contains("test.payu.in"));
    for field in &redirect.form_fields {
        assert!(html.contains(&format!(r#"name="{}""#, field.name)), "{}", field.name);
    }
}

#[tokio::test]
async fn test_empty_cart_sends_nothing() {
    let backend = MockBackend::start().await;
    let (state, cart) = signed_in_cart(&backend).await;

    let checkout = state.checkout();
    let err = checkout.submit(&cart, &form()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::EmptyCart));
    assert_eq!(checkout.last_error().as_deref(), Some("Your cart is empty"));
    assert!(backend.requests_to("/api/orders").is_empty());
}

#[tokio::test]
async fn test_incomplete_form_sends_nothing() {
    let backend = MockBackend::start().await;
    backend.seed_cart(&[("p1", 1)]);
    let (state, cart) = signed_in_cart(&backend).await;

    let incomplete = CheckoutForm {
        city: "  ".to_string(),
        ..form()
    };
    let checkout = state.checkout();
    let err = checkout.submit(&cart, &incomplete).await.unwrap_err();
    assert_eq!(err.user_message(), "City is required");
    assert_eq!(checkout.phase(), CheckoutPhase::FormEditing);
    assert!(backend.requests_to("/api/orders").is_empty());
}

#[tokio::test]
async fn test_order_creation_failure_returns_to_form() {
    let backend = MockBackend::start().await;
    backend.seed_cart(&[("p1", 1)]);
    let (state, cart) = signed_in_cart(&backend).await;
    backend.expire_token();

    let checkout = state.checkout();
    let err = checkout.submit(&cart, &form()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::OrderCreation(_)));
    assert_eq!(err.user_message(), "Token expired");
    assert_eq!(checkout.phase(), CheckoutPhase::FormEditing);
    assert_eq!(checkout.last_error().as_deref(), Some("Token expired"));
    assert!(backend.requests_to("/api/payment").is_empty());
}

#[tokio::test]
async fn test_redirected_checkout_cannot_resubmit() {
    let backend = MockBackend::start().await;
    backend.seed_cart(&[("p1", 1)]);
    let (state, cart) = signed_in_cart(&backend).await;

    let checkout = state.checkout();
    checkout.submit(&cart, &form()).await.unwrap();

    let err = checkout.submit(&cart, &form()).await.unwrap_err();
    assert!(matches!(err, CheckoutError::AlreadyRedirected));
    assert_eq!(backend.orders().len(), 1);
}
