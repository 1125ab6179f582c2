//! Integration test support for Kashly.
//!
//! Provides [`MockPricingServer`], an in-process pricing service speaking
//! the same JSON API as the real one: a fixed five-product catalog, 10%
//! commission, $5.00 handling per unit, and in-memory orders.
//!
//! # Example
//!
//! ```rust,ignore
//! let server = MockPricingServer::start().await;
//! let client = PricingClient::new(&server.config())?;
//! let quote = client.fetch_sample(&ProductId::new("B08N5WRWNW")).await?;
//! ```
//!
//! Failure injection: [`MockPricingServer::fail_next`] answers the next
//! request with a status code, [`MockPricingServer::delay_next`] holds it.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{Path, Request, State};
use axum::http::{StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use kashly_core::{
    AddressField, OrderId, OrderStatus, PaymentMethod, Price, ProductId, ShippingAddress,
};
use kashly_storefront::config::PricingServiceConfig;
use kashly_storefront::pricing::{Cart, CartItem, Order, ProductQuote};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use url::Url;

/// Catalog entries: id, title, price in cents, rating, reviews, seller.
const CATALOG: [(&str, &str, i64, f64, u64, &str); 5] = [
    ("B08N5WRWNW", "Echo Dot (4th Gen) Smart Speaker", 4999, 4.7, 45_230, "Amazon.com"),
    ("B0C1SLD1PZ", "AirPods Pro (2nd Generation)", 24_999, 4.4, 12_890, "Apple"),
    ("B0BDJ6M6JZ", "Kindle Paperwhite (11th Generation)", 13_999, 4.6, 8_920, "Amazon.com"),
    ("B0B2XZSTZ8", "Odyssey G7 32\" 4K Gaming Monitor", 79_999, 4.3, 2_340, "Samsung"),
    ("B09G9FPHY6", "Fire TV Stick 4K Max", 5_499, 4.5, 15_670, "Amazon.com"),
];

/// Markers that precede a product id in store URLs.
const ASIN_MARKERS: [&str; 4] = ["/dp/", "/gp/product/", "/product/", "asin="];

const ASIN_LEN: usize = 10;

/// Price a catalog item: 10% commission rounded to cents, $5.00 handling.
#[must_use]
pub fn price_quote(
    asin: &str,
    title: &str,
    base_cents: i64,
    rating: Option<f64>,
    review_count: Option<u64>,
    seller: Option<&str>,
) -> ProductQuote {
    let base = Decimal::new(base_cents, 2);
    let commission = (base * Decimal::new(10, 2)).round_dp(2);
    let handling = Decimal::new(500, 2);

    ProductQuote {
        asin: ProductId::new(asin),
        title: title.to_owned(),
        images: vec![format!("https://images.example.com/{asin}.jpg")],
        base_price: Price::new(base),
        commission: Price::new(commission),
        handling: Price::new(handling),
        cod_price: Price::new(base + commission + handling),
        rating,
        review_count,
        seller: seller.map(str::to_owned),
        availability: "In Stock".to_owned(),
        description: None,
    }
}

/// Pull a product id out of a store URL.
#[must_use]
pub fn extract_asin(url: &str) -> Option<String> {
    let is_asin = |s: &str| {
        s.len() == ASIN_LEN
            && s.bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
    };

    for marker in ASIN_MARKERS {
        if let Some(rest) = url.split_once(marker).map(|(_, rest)| rest)
            && let Some(candidate) = rest.get(..ASIN_LEN)
            && is_asin(candidate)
        {
            return Some(candidate.to_owned());
        }
    }

    // Bare `/{ASIN}/` path segment
    let mut segments = url.split('/').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_some() && is_asin(segment) {
            return Some(segment.to_owned());
        }
    }

    None
}

// =============================================================================
// Server
// =============================================================================

#[derive(Default)]
struct MockState {
    catalog: HashMap<String, ProductQuote>,
    orders: Mutex<HashMap<String, Order>>,
    requests: Mutex<Vec<String>>,
    fail_next: Mutex<Option<StatusCode>>,
    delay_next: Mutex<Option<Duration>>,
    token: Option<String>,
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// An in-process pricing service bound to an ephemeral local port.
///
/// Stops when dropped.
pub struct MockPricingServer {
    base_url: Url,
    state: Arc<MockState>,
    handle: JoinHandle<()>,
}

impl MockPricingServer {
    /// Start a server that accepts any caller.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn start() -> Self {
        Self::spawn(None).await
    }

    /// Start a server that rejects requests without `Bearer {token}`.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    pub async fn with_token(token: &str) -> Self {
        Self::spawn(Some(token.to_owned())).await
    }

    #[allow(clippy::expect_used)]
    async fn spawn(token: Option<String>) -> Self {
        let catalog = CATALOG
            .iter()
            .map(|&(asin, title, cents, rating, reviews, seller)| {
                (
                    asin.to_owned(),
                    price_quote(asin, title, cents, Some(rating), Some(reviews), Some(seller)),
                )
            })
            .collect();

        let state = Arc::new(MockState {
            catalog,
            token,
            ..MockState::default()
        });

        let app = Router::new()
            .route("/api/", get(root))
            .route("/api/amazon/lookup", post(lookup))
            .route("/api/products/{asin}", get(product))
            .route("/api/cart", post(cart))
            .route("/api/orders", post(create_order))
            .route("/api/orders/{order_id}", get(order))
            .layer(middleware::from_fn_with_state(Arc::clone(&state), intercept))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock pricing service");
        let addr = listener.local_addr().expect("mock service address");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let base_url = Url::parse(&format!("http://{addr}")).expect("mock service URL");

        Self {
            base_url,
            state,
            handle,
        }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Client settings pointing at this server.
    #[must_use]
    pub fn config(&self) -> PricingServiceConfig {
        PricingServiceConfig::with_base_url(self.base_url.clone())
    }

    /// Answer the next request with `status` and a `detail` message.
    pub fn fail_next(&self, status: StatusCode) {
        *lock(&self.state.fail_next) = Some(status);
    }

    /// Hold the next request for `delay` before answering it.
    pub fn delay_next(&self, delay: Duration) {
        *lock(&self.state.delay_next) = Some(delay);
    }

    /// Requests received so far, as `METHOD /path`.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        lock(&self.state.requests).clone()
    }

    /// Number of requests received for `METHOD /path`.
    #[must_use]
    pub fn request_count(&self, request: &str) -> usize {
        lock(&self.state.requests)
            .iter()
            .filter(|r| r.as_str() == request)
            .count()
    }

    /// Orders stored so far.
    #[must_use]
    pub fn order_count(&self) -> usize {
        lock(&self.state.orders).len()
    }
}

impl Drop for MockPricingServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// =============================================================================
// Handlers
// =============================================================================

fn detail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "detail": message }))).into_response()
}

fn missing(loc: &[&str]) -> Value {
    json!({ "loc": loc, "msg": "field required", "type": "value_error.missing" })
}

async fn intercept(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    lock(&state.requests).push(format!("{} {}", request.method(), request.uri().path()));

    if let Some(token) = &state.token {
        let expected = format!("Bearer {token}");
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected);
        if !authorized {
            return detail(StatusCode::UNAUTHORIZED, "Not authenticated");
        }
    }

    let delay = lock(&state.delay_next).take();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let failure = lock(&state.fail_next).take();
    if let Some(status) = failure {
        return detail(status, "Injected failure");
    }

    next.run(request).await
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Amazon COD API", "version": "1.0.0" }))
}

async fn lookup(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let asin = body
        .get("asin")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .or_else(|| body.get("url").and_then(Value::as_str).and_then(extract_asin));

    let Some(asin) = asin else {
        return detail(
            StatusCode::BAD_REQUEST,
            "Could not extract ASIN from URL or invalid ASIN provided",
        );
    };

    match state.catalog.get(&asin) {
        Some(quote) => Json(quote).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn product(State(state): State<Arc<MockState>>, Path(asin): Path<String>) -> Response {
    match state.catalog.get(&asin) {
        Some(quote) => Json(quote).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Product not found"),
    }
}

async fn cart(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Json<Cart> {
    let items: Vec<CartItem> = body
        .get("items")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|item| {
            let asin = item.get("asin")?.as_str()?;
            let quantity = item.get("quantity").map_or(Some(1), Value::as_u64)?;
            let product = state.catalog.get(asin)?;
            Some(CartItem {
                asin: ProductId::new(asin),
                quantity: u32::try_from(quantity).ok()?,
                product: product.clone(),
            })
        })
        .collect();

    let subtotal: Price = items.iter().map(|i| i.product.base_price * i.quantity).sum();
    let total_commission: Price = items.iter().map(|i| i.product.commission * i.quantity).sum();
    let total_handling: Price = items.iter().map(|i| i.product.handling * i.quantity).sum();

    Json(Cart {
        items,
        subtotal,
        total_commission,
        total_handling,
        total: subtotal + total_commission + total_handling,
    })
}

async fn create_order(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    let mut errors = Vec::new();

    let cart = body
        .get("cart")
        .cloned()
        .and_then(|v| serde_json::from_value::<Cart>(v).ok());
    if cart.is_none() {
        errors.push(missing(&["body", "cart"]));
    }

    let shipping = body.get("shipping").cloned().unwrap_or(Value::Null);
    for field in AddressField::REQUIRED {
        if field == AddressField::Country {
            continue;
        }
        if shipping.get(field.as_str()).and_then(Value::as_str).is_none() {
            errors.push(missing(&["body", "shipping", field.as_str()]));
        }
    }

    let shipping = serde_json::from_value::<ShippingAddress>(shipping).ok();
    let (Some(cart), Some(shipping), true) = (cart, shipping, errors.is_empty()) else {
        if errors.is_empty() {
            errors.push(missing(&["body", "shipping"]));
        }
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "detail": errors })),
        )
            .into_response();
    };

    let now = Utc::now();
    let order = Order {
        id: OrderId::new(uuid::Uuid::new_v4().to_string()),
        cart,
        shipping,
        payment_method: PaymentMethod::CashOnDelivery,
        status: OrderStatus::Pending,
        created_at: Some(now),
        updated_at: Some(now),
    };

    lock(&state.orders).insert(order.id.to_string(), order.clone());
    Json(order).into_response()
}

async fn order(State(state): State<Arc<MockState>>, Path(order_id): Path<String>) -> Response {
    match lock(&state.orders).get(&order_id) {
        Some(order) => Json(order.clone()).into_response(),
        None => detail(StatusCode::NOT_FOUND, "Order not found"),
    }
}
