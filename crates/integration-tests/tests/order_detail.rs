//! Order lookup and invoice download after checkout.

#![allow(clippy::unwrap_used)]

use shopfront_client::AppState;
use shopfront_client::checkout::CheckoutForm;
use shopfront_client::orders::{Invoice, OrderView};
use shopfront_core::{OrderId, OrderStatus, Price};
use shopfront_integration_tests::{INVOICE_BYTES, MockBackend, TEST_EMAIL, TEST_PASSWORD};

/// Sign in, check out `p1 × 2` and return the new order id.
async fn place_order(backend: &MockBackend) -> (AppState, OrderId) {
    backend.seed_cart(&[("p1", 2)]);
    let state = backend.app_state();
    state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();

    let store = state.open_cart();
    store.fetch_cart().await;

    let form = CheckoutForm {
        first_name: "Asha".to_string(),
        last_name: "Rao".to_string(),
        email: TEST_EMAIL.to_string(),
        phone: "9876543210".to_string(),
        address: "12 MG Road".to_string(),
        city: "Bengaluru".to_string(),
        state: "Karnataka".to_string(),
        postal_code: "560001".to_string(),
        ..CheckoutForm::default()
    };
    let redirect = state.checkout().submit(&store.cart(), &form).await.unwrap();
    let order_id = OrderId::new(redirect.field("txnid").unwrap());
    (state, order_id)
}

#[tokio::test]
async fn test_view_order() {
    let backend = MockBackend::start().await;
    let (state, order_id) = place_order(&backend).await;

    let OrderView::Found(order) = state.orders().view(&order_id).await else {
        panic!("expected order {order_id}");
    };
    assert_eq!(order.id, order_id);
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.customer_name(), "Asha Rao");
    assert_eq!(order.items.len(), 1);
    assert_eq!(order.items_total(), Price::from_units(120));
    assert_eq!(order.total_amount, Price::from_units(135));
    assert!(order.created_at.is_some());
}

#[tokio::test]
async fn test_render_order_text() {
    let backend = MockBackend::start().await;
    let (state, order_id) = place_order(&backend).await;

    let text = state.orders().view(&order_id).await.render_text().unwrap();
    assert!(text.contains(&format!("Order #{order_id}")));
    assert!(text.contains("2 x Linen Shirt @ ₹60.00 = ₹120.00"), "{text}");
    assert!(text.contains("Order total: ₹135.00"), "{text}");
    assert!(text.contains("Bengaluru"));
    assert!(text.contains("India"));
}

#[tokio::test]
async fn test_unknown_order() {
    let backend = MockBackend::start().await;
    let (state, _) = place_order(&backend).await;

    let missing = OrderId::new("ord_missing");
    let view = state.orders().view(&missing).await;
    assert_eq!(
        view,
        OrderView::NotFound {
            order_id: missing.clone()
        }
    );
    assert_eq!(view.render_text().unwrap(), "Order ord_missing not found.\n");
}

#[tokio::test]
async fn test_signed_out_lookup_is_not_found() {
    let backend = MockBackend::start().await;
    let (state, order_id) = place_order(&backend).await;
    state.sign_out();

    let view = state.orders().view(&order_id).await;
    assert!(matches!(view, OrderView::NotFound { .. }));
}

#[tokio::test]
async fn test_download_invoice() {
    let backend = MockBackend::start().await;
    let (state, order_id) = place_order(&backend).await;

    let invoice = state.orders().download_invoice(&order_id).await.unwrap();
    assert_eq!(invoice.bytes, INVOICE_BYTES);
    assert_eq!(invoice.content_type.as_deref(), Some("application/pdf"));
    assert_eq!(invoice.file_name, Invoice::default_file_name(&order_id));

    let request = backend.requests_to("/api/orders/invoice/").pop().unwrap();
    assert!(request.authorization.is_some());
    assert_eq!(
        state.api().invoice_url(&order_id).unwrap().path(),
        request.path
    );
}

#[tokio::test]
async fn test_invoice_for_unknown_order() {
    let backend = MockBackend::start().await;
    let (state, _) = place_order(&backend).await;

    let err = state
        .orders()
        .download_invoice(&OrderId::new("ord_missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
