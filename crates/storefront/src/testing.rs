//! In-memory pricing service for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use kashly_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, ProductUrl, ShippingAddress};
use rust_decimal::Decimal;
use tokio::sync::Semaphore;

use crate::pricing::{Cart, CartItem, CartLine, Order, PricingError, PricingService, ProductQuote};

/// Build a quote the way the service prices it: 10% commission, $5 handling.
pub fn quote(asin: &str, base_price: Decimal) -> ProductQuote {
    let commission = (base_price * Decimal::new(10, 2)).round_dp(2);
    let handling = Decimal::new(500, 2);
    ProductQuote {
        asin: ProductId::new(asin),
        title: format!("Product {asin}"),
        images: Vec::new(),
        base_price: Price::new(base_price),
        commission: Price::new(commission),
        handling: Price::new(handling),
        cod_price: Price::new(base_price + commission + handling),
        rating: None,
        review_count: None,
        seller: None,
        availability: "In Stock".to_string(),
        description: None,
    }
}

/// Scriptable [`PricingService`] backed by a fixed catalog.
///
/// Reconciliation skips unknown products, like the real service. Calls can
/// be failed one at a time or held in flight until [`Self::release`].
pub struct FakePricingService {
    catalog: HashMap<ProductId, ProductQuote>,
    fail_next: Mutex<Option<PricingError>>,
    reconcile_calls: Mutex<Vec<Vec<CartLine>>>,
    lookups: AtomicUsize,
    orders: AtomicUsize,
    gate: Option<Semaphore>,
}

impl FakePricingService {
    pub fn new() -> Self {
        let catalog = [
            quote("X1", Decimal::new(1000, 2)),
            quote("X2", Decimal::new(2550, 2)),
            quote("B08N5WRWNW", Decimal::new(4999, 2)),
            quote("B0C1SLD1PZ", Decimal::new(24999, 2)),
            quote("B0BDJ6M6JZ", Decimal::new(13999, 2)),
        ]
        .into_iter()
        .map(|q| (q.asin.clone(), q))
        .collect();

        Self {
            catalog,
            fail_next: Mutex::new(None),
            reconcile_calls: Mutex::new(Vec::new()),
            lookups: AtomicUsize::new(0),
            orders: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Hold every call until a permit is released.
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    /// Let `calls` held calls proceed.
    pub fn release(&self, calls: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(calls);
        }
    }

    /// Fail the next call with `err`.
    pub fn fail_next(&self, err: PricingError) {
        *self.fail_next.lock().unwrap() = Some(err);
    }

    /// Line lists received by `reconcile_cart`, in call order.
    pub fn reconcile_calls(&self) -> Vec<Vec<CartLine>> {
        self.reconcile_calls.lock().unwrap().clone()
    }

    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn order_count(&self) -> usize {
        self.orders.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), PricingError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| PricingError::Unavailable(e.to_string()))?
                .forget();
        }
        match self.fail_next.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn quote_for(&self, product_id: &ProductId) -> Result<ProductQuote, PricingError> {
        self.catalog
            .get(product_id)
            .cloned()
            .ok_or_else(|| PricingError::NotFound("Product not found".to_string()))
    }

    fn price(&self, lines: &[CartLine]) -> Cart {
        let items: Vec<CartItem> = lines
            .iter()
            .filter_map(|line| {
                self.catalog.get(&line.product_id).map(|product| CartItem {
                    asin: line.product_id.clone(),
                    quantity: line.quantity,
                    product: product.clone(),
                })
            })
            .collect();

        Cart {
            subtotal: items.iter().map(|i| i.product.base_price * i.quantity).sum(),
            total_commission: items.iter().map(|i| i.product.commission * i.quantity).sum(),
            total_handling: items.iter().map(|i| i.product.handling * i.quantity).sum(),
            total: items.iter().map(|i| i.product.cod_price * i.quantity).sum(),
            items,
        }
    }
}

#[async_trait]
impl PricingService for FakePricingService {
    async fn lookup(&self, url: &ProductUrl) -> Result<ProductQuote, PricingError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        url.as_url()
            .path_segments()
            .into_iter()
            .flatten()
            .map(ProductId::from)
            .find(|id| self.catalog.contains_key(id))
            .map_or_else(
                || Err(PricingError::NotFound("Product not found".to_string())),
                |id| self.quote_for(&id),
            )
    }

    async fn fetch_sample(&self, product_id: &ProductId) -> Result<ProductQuote, PricingError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.enter().await?;
        self.quote_for(product_id)
    }

    async fn reconcile_cart(&self, lines: &[CartLine]) -> Result<Cart, PricingError> {
        self.reconcile_calls.lock().unwrap().push(lines.to_vec());
        self.enter().await?;
        Ok(self.price(lines))
    }

    async fn place_order(
        &self,
        cart: &Cart,
        shipping: &ShippingAddress,
    ) -> Result<Order, PricingError> {
        self.enter().await?;
        let n = self.orders.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Order {
            id: OrderId::new(format!("order-{n}")),
            cart: cart.clone(),
            shipping: shipping.clone(),
            payment_method: PaymentMethod::CashOnDelivery,
            status: OrderStatus::Pending,
            created_at: None,
            updated_at: None,
        })
    }
}

/// A shipping address with every field filled in.
pub fn address() -> ShippingAddress {
    ShippingAddress {
        full_name: "Ana Gómez".to_string(),
        phone: "+1 555 0100".to_string(),
        address_line1: "12 Harbor St".to_string(),
        address_line2: None,
        city: "Portland".to_string(),
        state: "OR".to_string(),
        postal_code: "97201".to_string(),
        country: "US".to_string(),
    }
}
