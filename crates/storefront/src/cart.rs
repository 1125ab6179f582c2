//! Cart store with server-side reconciliation.
//!
//! # Architecture
//!
//! - Every mutation computes the complete desired line list locally, sends
//!   it to [`PricingService::reconcile_cart`] and adopts the response
//!   verbatim. Deltas are never sent.
//! - Mutations are serialized through a FIFO intent queue held across the
//!   whole round trip, so a queued mutation always builds on the outcome of
//!   the one before it.
//! - The visible cart lives in a `watch` channel: reads never wait behind an
//!   in-flight mutation and observers can [`CartStore::subscribe`].
//! - A failed call leaves the visible cart exactly as it was.

use std::sync::Arc;

use kashly_core::{ProductId, ShippingAddress};
use tokio::sync::{Mutex, watch};
use tracing::{debug, instrument, warn};

use crate::error::{Result, ShopError};
use crate::pricing::{Cart, CartLine, Order, PricingError, PricingService};

/// The shopper's cart, kept in sync with the pricing service.
pub struct CartStore<S> {
    service: Arc<S>,
    queue: Mutex<()>,
    cart: watch::Sender<Cart>,
}

impl<S> std::fmt::Debug for CartStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &*self.cart.borrow())
            .finish_non_exhaustive()
    }
}

impl<S: PricingService> CartStore<S> {
    /// Create an empty cart store.
    pub fn new(service: Arc<S>) -> Self {
        let (cart, _) = watch::channel(Cart::default());
        Self {
            service,
            queue: Mutex::new(()),
            cart,
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Snapshot of the visible cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.cart.borrow().clone()
    }

    /// Number of distinct lines, as shown on the cart badge.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.cart.borrow().item_count()
    }

    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.cart.borrow().total_quantity()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.borrow().is_empty()
    }

    /// Watch the visible cart for changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Cart> {
        self.cart.subscribe()
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add one unit of a product, appending a new line if it is not in the
    /// cart yet.
    ///
    /// # Errors
    ///
    /// Returns the pricing service failure; the cart is left unchanged.
    #[instrument(skip(self, product_id), fields(asin = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> Result<Cart> {
        let _turn = self.queue.lock().await;

        let mut lines = self.lines();
        match lines.iter_mut().find(|line| &line.product_id == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => lines.push(CartLine::new(product_id.clone(), 1)),
        }

        self.reconcile(lines).await
    }

    /// Replace a line's quantity. Zero removes the line.
    ///
    /// A product that is not in the cart is left alone and nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns the pricing service failure; the cart is left unchanged.
    #[instrument(skip(self, product_id), fields(asin = %product_id))]
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<Cart> {
        if quantity == 0 {
            return self.remove(product_id).await;
        }

        let _turn = self.queue.lock().await;

        let mut lines = self.lines();
        let Some(line) = lines.iter_mut().find(|line| &line.product_id == product_id) else {
            debug!("Product not in cart, nothing to update");
            return Ok(self.cart());
        };
        line.quantity = quantity;

        self.reconcile(lines).await
    }

    /// Delete a product's line, keeping the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns the pricing service failure; the cart is left unchanged.
    #[instrument(skip(self, product_id), fields(asin = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<Cart> {
        let _turn = self.queue.lock().await;

        let mut lines = self.lines();
        let before = lines.len();
        lines.retain(|line| &line.product_id != product_id);
        if lines.len() == before {
            debug!("Product not in cart, nothing to remove");
            return Ok(self.cart());
        }

        self.reconcile(lines).await
    }

    /// Submit the cart for cash-on-delivery and reset it to empty.
    ///
    /// # Errors
    ///
    /// - [`ShopError::EmptyCart`] if there is nothing to order
    /// - [`PricingError::ValidationFailed`] if required address fields are
    ///   missing, before anything is sent
    /// - any pricing service failure, with the cart left unchanged
    #[instrument(skip(self, shipping))]
    pub async fn place_order(&self, shipping: &ShippingAddress) -> Result<Order> {
        let _turn = self.queue.lock().await;

        let cart = self.cart();
        if cart.is_empty() {
            return Err(ShopError::EmptyCart);
        }
        shipping.validate().map_err(PricingError::from)?;

        let order = self
            .service
            .place_order(&cart, shipping)
            .await
            .inspect_err(|e| warn!(error = %e, "Order placement failed"))?;

        self.cart.send_replace(Cart::default());
        debug!(order_id = %order.id, "Cart reset after order");
        Ok(order)
    }

    fn lines(&self) -> Vec<CartLine> {
        self.cart.borrow().lines()
    }

    /// Price `lines` and adopt the result. Caller holds the queue.
    async fn reconcile(&self, lines: Vec<CartLine>) -> Result<Cart> {
        let cart = self
            .service
            .reconcile_cart(&lines)
            .await
            .inspect_err(|e| warn!(error = %e, "Cart reconciliation failed"))?;

        debug!(
            lines = cart.item_count(),
            total = %cart.total,
            "Cart reconciled"
        );
        self.cart.send_replace(cart.clone());
        Ok(cart)
    }
}
