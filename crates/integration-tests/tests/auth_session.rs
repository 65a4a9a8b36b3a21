//! Sign-up, sign-in and session handling against the mock backend.

#![allow(clippy::unwrap_used)]

use shopfront_client::ApiError;
use shopfront_client::api::REQUEST_ID_HEADER;
use shopfront_integration_tests::{
    EnvelopeStyle, MockBackend, TEST_EMAIL, TEST_PASSWORD, TEST_TOKEN, TEST_USER_ID,
};

#[tokio::test]
async fn test_login_stores_credentials() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    let message = state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert_eq!(message, "Welcome back");

    let credentials = state.session().credentials().unwrap();
    assert_eq!(credentials.user_id.as_str(), TEST_USER_ID);
    assert_eq!(credentials.email.as_str(), TEST_EMAIL);

    let entries = credentials.entries();
    assert!(entries.iter().any(|(_, value)| value == TEST_TOKEN));
}

#[tokio::test]
async fn test_login_through_nested_envelope() {
    let backend = MockBackend::start().await;
    backend.set_envelope(EnvelopeStyle::Nested);
    let state = backend.app_state();

    state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert!(state.session().is_authenticated());
}

#[tokio::test]
async fn test_every_request_carries_a_request_id() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    state.open_cart().fetch_cart().await;

    let requests = backend.requests();
    assert_eq!(requests.len(), 2);
    let ids: Vec<String> = requests
        .iter()
        .map(|r| r.request_id.clone().unwrap())
        .collect();
    assert!(ids.iter().all(|id| id.len() == 36), "{REQUEST_ID_HEADER}: {ids:?}");
    assert_ne!(ids[0], ids[1]);
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    let err = state.api().login(TEST_EMAIL, "Wrong#123").await.unwrap_err();
    assert!(matches!(&err, ApiError::Unauthorized(m) if m == "Invalid email or password"));
    assert_eq!(err.user_message(), "Invalid email or password");
    assert!(!state.session().is_authenticated());
}

#[tokio::test]
async fn test_failed_login_clears_previous_session() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    assert!(state.session().is_authenticated());

    state.api().login(TEST_EMAIL, "Wrong#123").await.unwrap_err();
    assert!(!state.session().is_authenticated());
}

#[tokio::test]
async fn test_register_then_login() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    let message = state
        .api()
        .register("Ravi Kumar", "ravi@example.com", "Marigold#77")
        .await
        .unwrap();
    assert_eq!(message, "User registered successfully");
    assert!(!state.session().is_authenticated());

    let err = state
        .api()
        .register("Ravi Kumar", "ravi@example.com", "Marigold#77")
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        ApiError::Api { status: 400, message: Some(m) } if m == "User already exists"
    ));
}

#[tokio::test]
async fn test_register_validates_before_sending() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    let err = state
        .api()
        .register("Ravi", "not-an-email", "Marigold#77")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = state
        .api()
        .register("Ravi", "ravi@example.com", "short")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_signed_out_cart_request_is_not_sent() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    let cart = state.open_cart();
    cart.fetch_cart().await;

    assert_eq!(cart.error().as_deref(), Some("Not signed in"));
    assert!(backend.requests_to("/api/cart").is_empty());
}

#[tokio::test]
async fn test_bearer_token_is_sent() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    state.open_cart().fetch_cart().await;

    let login = &backend.requests_to("/api/auth/login")[0];
    assert_eq!(login.authorization, None);

    let cart = &backend.requests_to("/api/cart")[0];
    assert_eq!(
        cart.authorization.as_deref(),
        Some(format!("Bearer {TEST_TOKEN}").as_str())
    );
}

#[tokio::test]
async fn test_sign_out() {
    let backend = MockBackend::start().await;
    let state = backend.app_state();

    state.api().login(TEST_EMAIL, TEST_PASSWORD).await.unwrap();
    state.sign_out();

    assert!(!state.session().is_authenticated());
    let cart = state.open_cart();
    cart.fetch_cart().await;
    assert!(backend.requests_to("/api/cart").is_empty());
}
