//! Integration test support for the Shopfront client.
//!
//! [`MockBackend`] is an in-process storefront backend served by `axum` on
//! an ephemeral port. It keeps one shopper's cart and orders in memory,
//! records every request it sees, and can be switched between the response
//! envelopes and failure modes the real backend exhibits.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! let backend = MockBackend::start().await;
//! let state = backend.app_state();
//! state.api().login(TEST_EMAIL, TEST_PASSWORD).await?;
//!
//! let cart = state.open_cart();
//! cart.fetch_cart().await;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shopfront_client::session::SessionStore;
use shopfront_client::{AppState, ClientConfig};

/// Token issued by the mock login endpoint.
pub const TEST_TOKEN: &str = "test-token-7f3a";
/// User id issued by the mock login endpoint.
pub const TEST_USER_ID: &str = "u_100";
/// Pre-registered shopper.
pub const TEST_EMAIL: &str = "asha@example.com";
pub const TEST_PASSWORD: &str = "Sunflower#42";
/// Payment gateway URL returned by the payment endpoint.
pub const PAYU_URL: &str = "https://test.payu.in/_payment";
/// Body served for every invoice download.
pub const INVOICE_BYTES: &[u8] = b"%PDF-1.4\n% mock invoice\n";

/// How success payloads are wrapped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EnvelopeStyle {
    /// `T`
    #[default]
    Bare,
    /// `{"success": true, "data": T}`
    Wrapped,
    /// `{"data": {"data": T}}`
    Nested,
}

impl EnvelopeStyle {
    fn wrap(self, payload: Value) -> Value {
        match self {
            Self::Bare => payload,
            Self::Wrapped => json!({ "success": true, "data": payload }),
            Self::Nested => json!({ "data": { "data": payload } }),
        }
    }
}

/// A request as seen by the mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub request_id: Option<String>,
}

#[derive(Debug, Default)]
struct BackendState {
    products: Vec<Value>,
    users: HashMap<String, String>,
    cart: Vec<(String, u32)>,
    orders: BTreeMap<String, Value>,
    order_requests: Vec<Value>,
    requests: Vec<RecordedRequest>,
    envelope: EnvelopeStyle,
    fail_cart_writes: bool,
    token_expired: bool,
    next_order: u32,
}

impl BackendState {
    fn seeded() -> Self {
        let products = vec![
            product("p1", "Linen Shirt", 60, "clothing"),
            product("p2", "Canvas Tote", 45, "bags"),
            product("p3", "Leather Loafers", 150, "shoes"),
            product("p4", "Silk Scarf", 25, "accessories"),
            product("p5", "Denim Jacket", 90, "clothing"),
            product("p6", "Weekender Duffel", 130, "bags"),
            product("p7", "Canvas Sneakers", 70, "shoes"),
            product("p8", "Woven Belt", 20, "accessories"),
            product("p9", "Cotton Kurta", 40, "clothing"),
            product("p10", "Sling Bag", 35, "bags"),
        ];
        Self {
            products,
            users: HashMap::from([(TEST_EMAIL.to_string(), TEST_PASSWORD.to_string())]),
            ..Self::default()
        }
    }

    fn product(&self, id: &str) -> Option<&Value> {
        self.products.iter().find(|p| p["_id"] == id)
    }

    /// Cart body with populated products.
    fn cart_body(&self) -> Value {
        let items: Vec<Value> = self
            .cart
            .iter()
            .filter_map(|(id, quantity)| {
                self.product(id)
                    .map(|p| json!({ "product": p, "quantity": quantity }))
            })
            .collect();
        json!({ "items": items })
    }

    /// Cart body with products as bare ids, as the add endpoint sends it.
    fn cart_ids_body(&self) -> Value {
        let items: Vec<Value> = self
            .cart
            .iter()
            .map(|(id, quantity)| json!({ "product": id, "quantity": quantity }))
            .collect();
        json!({ "items": items })
    }

    fn ok(&self, payload: Value) -> Response {
        (StatusCode::OK, Json(self.envelope.wrap(payload))).into_response()
    }
}

fn product(id: &str, name: &str, price: u32, category: &str) -> Value {
    json!({
        "_id": id,
        "name": name,
        "price": price,
        "category": category,
        "image": format!("/images/{id}.jpg"),
        "description": format!("{name} from the mock catalog"),
        "rating": 4.5,
        "inStock": true
    })
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

/// In-process storefront backend.
#[derive(Debug, Clone)]
pub struct MockBackend {
    state: Arc<Mutex<BackendState>>,
    base_url: String,
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(BackendState::seeded()));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock backend");
        let addr = listener.local_addr().expect("Mock backend has no address");

        let app = router(Arc::clone(&state));
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            state,
            base_url: format!("http://{addr}"),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the base URL is rejected.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        ClientConfig::with_base_url(&self.base_url).expect("Mock backend URL is valid")
    }

    /// Signed-out application state wired to this backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn app_state(&self) -> AppState {
        AppState::with_session(self.config(), SessionStore::new())
            .expect("Failed to build app state")
    }

    fn lock(&self) -> MutexGuard<'_, BackendState> {
        lock(&self.state)
    }

    pub fn set_envelope(&self, envelope: EnvelopeStyle) {
        self.lock().envelope = envelope;
    }

    /// Make cart writes fail with a 500.
    pub fn fail_cart_writes(&self, fail: bool) {
        self.lock().fail_cart_writes = fail;
    }

    /// Reject the issued token from now on.
    pub fn expire_token(&self) {
        self.lock().token_expired = true;
    }

    /// Replace the server cart directly.
    pub fn seed_cart(&self, lines: &[(&str, u32)]) {
        self.lock().cart = lines
            .iter()
            .map(|(id, quantity)| ((*id).to_string(), *quantity))
            .collect();
    }

    /// Server cart as `(product id, quantity)` pairs.
    #[must_use]
    pub fn cart(&self) -> Vec<(String, u32)> {
        self.lock().cart.clone()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Requests whose path starts with `prefix`.
    #[must_use]
    pub fn requests_to(&self, prefix: &str) -> Vec<RecordedRequest> {
        self.lock()
            .requests
            .iter()
            .filter(|r| r.path.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Bodies posted to the order-creation endpoint.
    #[must_use]
    pub fn order_requests(&self) -> Vec<Value> {
        self.lock().order_requests.clone()
    }

    /// Orders created so far, by id.
    #[must_use]
    pub fn orders(&self) -> BTreeMap<String, Value> {
        self.lock().orders.clone()
    }
}

type Shared = Arc<Mutex<BackendState>>;

fn lock(state: &Shared) -> MutexGuard<'_, BackendState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/products", get(list_products))
        .route("/api/products/{id}", get(get_product))
        .route(
            "/api/cart",
            get(get_cart).post(add_to_cart).put(update_cart),
        )
        .route("/api/cart/item/{id}", delete(remove_from_cart))
        .route("/api/cart/clear", delete(clear_cart))
        .route("/api/orders", post(create_order))
        .route("/api/orders/{id}", get(get_order))
        .route("/api/orders/invoice/{id}", get(download_invoice))
        .route("/api/payment/payu", post(initiate_payment))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let recorded = {
        let header_value = |name: &str| {
            request
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(String::from)
        };
        RecordedRequest {
            method: request.method().to_string(),
            path: request.uri().path().to_string(),
            query: request.uri().query().map(String::from),
            authorization: header_value(header::AUTHORIZATION.as_str()),
            request_id: header_value("x-request-id"),
        }
    };
    lock(&state).requests.push(recorded);
    next.run(request).await
}

fn authorize(state: &BackendState, headers: &HeaderMap) -> Result<(), Response> {
    let expected = format!("Bearer {TEST_TOKEN}");
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match presented {
        None => Err(error(StatusCode::UNAUTHORIZED, "No token provided")),
        Some(_) if state.token_expired => Err(error(StatusCode::UNAUTHORIZED, "Token expired")),
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(error(StatusCode::FORBIDDEN, "Invalid token")),
    }
}

// =============================================================================
// Auth
// =============================================================================

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut state = lock(&state);
    let email = body["email"].as_str().unwrap_or_default().to_string();
    let password = body["password"].as_str().unwrap_or_default().to_string();

    if state.users.contains_key(&email) {
        return error(StatusCode::BAD_REQUEST, "User already exists");
    }
    state.users.insert(email, password);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "User registered successfully" })),
    )
        .into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let state = lock(&state);
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if state.users.get(email).map(String::as_str) != Some(password) {
        return error(StatusCode::UNAUTHORIZED, "Invalid email or password");
    }
    state.ok(json!({
        "accessToken": TEST_TOKEN,
        "userId": TEST_USER_ID,
        "message": "Welcome back"
    }))
}

// =============================================================================
// Catalog
// =============================================================================

async fn list_products(
    State(state): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let state = lock(&state);
    let page: usize = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: usize = params.get("limit").and_then(|l| l.parse().ok()).unwrap_or(8);
    let search = params.get("search").map(|s| s.to_lowercase());

    let matching: Vec<&Value> = state
        .products
        .iter()
        .filter(|p| params.get("category").is_none_or(|c| p["category"] == c.as_str()))
        .filter(|p| {
            search.as_ref().is_none_or(|s| {
                p["name"]
                    .as_str()
                    .is_some_and(|name| name.to_lowercase().contains(s))
            })
        })
        .collect();

    let data: Vec<&Value> = matching
        .iter()
        .skip(page.saturating_sub(1) * limit)
        .take(limit)
        .copied()
        .collect();
    let listing = json!({
        "data": data,
        "pagination": {
            "total": matching.len(),
            "page": page,
            "limit": limit,
            "pages": matching.len().div_ceil(limit.max(1))
        }
    });

    // Listings are never double-wrapped; the nested style wraps once.
    let body = match state.envelope {
        EnvelopeStyle::Bare => listing,
        EnvelopeStyle::Wrapped | EnvelopeStyle::Nested => json!({ "data": listing }),
    };
    (StatusCode::OK, Json(body)).into_response()
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let state = lock(&state);
    match state.product(&id) {
        Some(product) => state.ok(product.clone()),
        None => error(StatusCode::NOT_FOUND, "Product not found"),
    }
}

// =============================================================================
// Cart
// =============================================================================

fn cart_line(body: &Value) -> Option<(String, u32)> {
    let id = body["productId"].as_str()?.to_string();
    let quantity = u32::try_from(body["quantity"].as_u64()?).ok()?;
    Some((id, quantity))
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    state.ok(state.cart_body())
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if state.fail_cart_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    let Some((id, quantity)) = cart_line(&body) else {
        return error(StatusCode::BAD_REQUEST, "productId and quantity are required");
    };
    if state.product(&id).is_none() {
        return error(StatusCode::NOT_FOUND, "Product not found");
    }

    match state.cart.iter_mut().find(|(existing, _)| *existing == id) {
        Some((_, existing)) => *existing += quantity,
        None => state.cart.push((id, quantity)),
    }
    state.ok(state.cart_ids_body())
}

async fn update_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if state.fail_cart_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    let Some((id, quantity)) = cart_line(&body) else {
        return error(StatusCode::BAD_REQUEST, "productId and quantity are required");
    };

    let Some(line) = state.cart.iter_mut().find(|(existing, _)| *existing == id) else {
        return error(StatusCode::NOT_FOUND, "Item not in cart");
    };
    line.1 = quantity;
    state.ok(state.cart_body())
}

async fn remove_from_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if state.fail_cart_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    state.cart.retain(|(existing, _)| *existing != id);
    state.ok(state.cart_body())
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if state.fail_cart_writes {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    state.cart.clear();
    StatusCode::NO_CONTENT.into_response()
}

// =============================================================================
// Orders & Payment
// =============================================================================

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if state.cart.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Cart is empty");
    }

    state.next_order += 1;
    let order_id = format!("ord_{}", state.next_order);
    let items: Vec<Value> = state
        .cart
        .iter()
        .enumerate()
        .filter_map(|(n, (id, quantity))| {
            state.product(id).map(|p| {
                json!({
                    "_id": format!("li_{n}"),
                    "product": { "_id": id, "name": p["name"] },
                    "price": p["price"],
                    "quantity": quantity
                })
            })
        })
        .collect();

    let order = json!({
        "_id": order_id,
        "items": items,
        "firstName": body["firstName"],
        "lastName": body["lastName"],
        "email": body["email"],
        "phone": body["phone"],
        "shippingAddress": body["shippingAddress"],
        "status": "pending",
        "totalAmount": body["totalAmount"],
        "createdAt": "2026-10-17T09:30:00Z"
    });

    state.order_requests.push(body);
    state.orders.insert(order_id, order.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": { "order": order } })),
    )
        .into_response()
}

async fn initiate_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    let order_id = body["orderId"].as_str().unwrap_or_default();
    let Some(order) = state.orders.get(order_id) else {
        return error(StatusCode::NOT_FOUND, "Order not found");
    };

    state.ok(json!({
        "payuURL": PAYU_URL,
        "params": {
            "key": "gtKFFx",
            "txnid": order_id,
            "amount": order["totalAmount"].to_string(),
            "productinfo": "Shopfront order",
            "firstname": order["firstName"],
            "email": order["email"],
            "udf1": null,
            "hash": "9f86d081884c7d65"
        }
    }))
}

async fn get_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    match state.orders.get(&id) {
        Some(order) => state.ok(order.clone()),
        None => error(StatusCode::NOT_FOUND, "Order not found"),
    }
}

async fn download_invoice(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    let state = lock(&state);
    if let Err(response) = authorize(&state, &headers) {
        return response;
    }
    if !state.orders.contains_key(&id) {
        return error(StatusCode::NOT_FOUND, "Order not found");
    }
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/pdf")],
        INVOICE_BYTES,
    )
        .into_response()
}
