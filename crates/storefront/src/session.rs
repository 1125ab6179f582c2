//! Shopper session: one cart store and one navigator over a shared service.
//!
//! [`Shop`] is the single entry point for shopper intents. Each successful
//! intent returns a [`Notice`] for the presentation layer to show; each
//! failure returns a [`ShopError`] and leaves both the cart and the screen
//! as they were.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use kashly_core::{OrderId, ProductId, ProductUrl, ShippingAddress};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

use crate::cart::CartStore;
use crate::error::{Operation, Result, ShopError};
use crate::navigation::{Navigator, Screen, View};
use crate::pricing::{Cart, PricingError, PricingService};

/// User-facing confirmation of a successful intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    ProductFound { title: String },
    SampleLoaded { title: String },
    AddedToCart { title: String },
    QuantityUpdated { product_id: ProductId, quantity: u32 },
    ItemRemoved { product_id: ProductId },
    OrderPlaced { order_id: OrderId },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProductFound { title } => write!(f, "Product found: {title}"),
            Self::SampleLoaded { title } => write!(f, "Sample product loaded: {title}"),
            Self::AddedToCart { title } => write!(f, "Added to cart: {title}"),
            Self::QuantityUpdated {
                product_id,
                quantity,
            } => write!(f, "Quantity of {product_id} set to {quantity}"),
            Self::ItemRemoved { product_id } => write!(f, "Removed {product_id} from cart"),
            Self::OrderPlaced { order_id } => write!(f, "Order placed successfully: {order_id}"),
        }
    }
}

/// A shopper session.
///
/// `Send + Sync` when the service is, so it can be shared behind an `Arc`
/// by the presentation layer.
pub struct Shop<S> {
    service: Arc<S>,
    cart: CartStore<S>,
    nav: Mutex<Navigator>,
    lookup_pending: AtomicBool,
    order_pending: AtomicBool,
}

impl<S> fmt::Debug for Shop<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shop")
            .field("cart", &self.cart)
            .field("lookup_pending", &self.lookup_pending.load(Ordering::Relaxed))
            .field("order_pending", &self.order_pending.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Clears an in-flight flag when the operation finishes, however it ends.
struct Pending<'a>(&'a AtomicBool);

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<S: PricingService> Shop<S> {
    /// Start a session on the search screen with an empty cart.
    pub fn new(service: S) -> Self {
        Self::with_shared(Arc::new(service))
    }

    /// Start a session over a service shared with other owners.
    pub fn with_shared(service: Arc<S>) -> Self {
        Self {
            cart: CartStore::new(Arc::clone(&service)),
            service,
            nav: Mutex::new(Navigator::new()),
            lookup_pending: AtomicBool::new(false),
            order_pending: AtomicBool::new(false),
        }
    }

    // =========================================================================
    // Readers
    // =========================================================================

    /// Snapshot of the live view.
    #[must_use]
    pub fn view(&self) -> View {
        self.with_nav(|nav| nav.view().clone())
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.with_nav(|nav| nav.screen())
    }

    /// Snapshot of the visible cart.
    #[must_use]
    pub fn cart(&self) -> Cart {
        self.cart.cart()
    }

    #[must_use]
    pub const fn cart_store(&self) -> &CartStore<S> {
        &self.cart
    }

    /// Watch the visible cart for changes.
    #[must_use]
    pub fn subscribe_cart(&self) -> watch::Receiver<Cart> {
        self.cart.subscribe()
    }

    #[must_use]
    pub fn service(&self) -> &S {
        &self.service
    }

    // =========================================================================
    // Product Intents
    // =========================================================================

    /// Look up a pasted product URL and show the quote.
    ///
    /// # Errors
    ///
    /// - [`PricingError::Invalid`] for an empty or malformed URL, without
    ///   contacting the service
    /// - [`ShopError::AlreadyPending`] if a lookup is in flight
    /// - [`ShopError::InvalidTransition`] unless searching or viewing a product
    /// - any pricing service failure
    #[instrument(skip(self))]
    pub async fn lookup(&self, raw_url: &str) -> Result<Notice> {
        let url = ProductUrl::parse(raw_url).map_err(PricingError::from)?;
        let _pending = self.begin(Operation::Lookup)?;
        self.ensure_accepts_product()?;

        let quote = self.service.lookup(&url).await?;
        let title = quote.title.clone();
        self.with_nav(|nav| nav.show_product(quote))?;

        info!(title = %title, "Product found");
        Ok(Notice::ProductFound { title })
    }

    /// Load a demonstration catalog item and show the quote.
    ///
    /// # Errors
    ///
    /// Same as [`Self::lookup`], minus URL parsing.
    #[instrument(skip(self, product_id), fields(asin = %product_id))]
    pub async fn load_sample(&self, product_id: &ProductId) -> Result<Notice> {
        let _pending = self.begin(Operation::Lookup)?;
        self.ensure_accepts_product()?;

        let quote = self.service.fetch_sample(product_id).await?;
        let title = quote.title.clone();
        self.with_nav(|nav| nav.show_product(quote))?;

        Ok(Notice::SampleLoaded { title })
    }

    // =========================================================================
    // Cart Intents
    // =========================================================================

    /// Add one unit of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns the pricing service failure; the cart is left unchanged.
    /// A product the service leaves out of the reconciled cart is
    /// [`PricingError::NotFound`].
    pub async fn add_to_cart(&self, product_id: &ProductId) -> Result<Notice> {
        let cart = self.cart.add(product_id).await?;
        let item = cart
            .item(product_id)
            .ok_or_else(|| PricingError::NotFound(format!("Product {product_id} not found")))?;
        Ok(Notice::AddedToCart {
            title: item.product.title.clone(),
        })
    }

    /// Set a line's quantity; zero removes it.
    ///
    /// # Errors
    ///
    /// Returns the pricing service failure; the cart is left unchanged.
    pub async fn set_quantity(&self, product_id: &ProductId, quantity: u32) -> Result<Notice> {
        self.cart.set_quantity(product_id, quantity).await?;
        Ok(if quantity == 0 {
            Notice::ItemRemoved {
                product_id: product_id.clone(),
            }
        } else {
            Notice::QuantityUpdated {
                product_id: product_id.clone(),
                quantity,
            }
        })
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns the pricing service failure; the cart is left unchanged.
    pub async fn remove_from_cart(&self, product_id: &ProductId) -> Result<Notice> {
        self.cart.remove(product_id).await?;
        Ok(Notice::ItemRemoved {
            product_id: product_id.clone(),
        })
    }

    // =========================================================================
    // Navigation Intents
    // =========================================================================

    pub fn open_cart(&self) {
        self.with_nav(Navigator::open_cart);
    }

    pub fn open_search(&self) {
        self.with_nav(Navigator::open_search);
    }

    /// Move from the cart to address entry.
    ///
    /// # Errors
    ///
    /// [`ShopError::InvalidTransition`] unless viewing the cart, then
    /// [`ShopError::EmptyCart`] if there is nothing to order.
    pub fn checkout(&self) -> Result<()> {
        let empty = self.cart.is_empty();
        self.with_nav(|nav| {
            if nav.screen() == Screen::Cart && empty {
                return Err(ShopError::EmptyCart);
            }
            nav.checkout().map_err(ShopError::from)
        })
    }

    /// Place a cash-on-delivery order for the current cart and show it.
    ///
    /// # Errors
    ///
    /// - [`ShopError::AlreadyPending`] if an order is in flight
    /// - [`ShopError::InvalidTransition`] unless checking out
    /// - [`ShopError::EmptyCart`], missing address fields, or any pricing
    ///   service failure; the screen stays on checkout and the cart untouched
    #[instrument(skip(self, shipping))]
    pub async fn place_order(&self, shipping: &ShippingAddress) -> Result<Notice> {
        let _pending = self.begin(Operation::PlaceOrder)?;
        self.with_nav(|nav| nav.ensure_checking_out())?;

        let order = self.cart.place_order(shipping).await?;
        let order_id = order.id.clone();
        self.with_nav(|nav| nav.complete_order(order));

        info!(order_id = %order_id, "Order placed");
        Ok(Notice::OrderPlaced { order_id })
    }

    /// Leave the success screen for a fresh search.
    ///
    /// # Errors
    ///
    /// [`ShopError::InvalidTransition`] unless an order was just completed.
    pub fn continue_shopping(&self) -> Result<()> {
        self.with_nav(Navigator::continue_shopping)
            .map_err(ShopError::from)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn begin(&self, operation: Operation) -> Result<Pending<'_>> {
        let flag = match operation {
            Operation::Lookup => &self.lookup_pending,
            Operation::PlaceOrder => &self.order_pending,
        };
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| ShopError::AlreadyPending(operation))?;
        Ok(Pending(flag))
    }

    fn ensure_accepts_product(&self) -> Result<()> {
        self.with_nav(|nav| {
            if nav.accepts_product() {
                Ok(())
            } else {
                Err(ShopError::InvalidTransition(
                    crate::navigation::NavigationError {
                        from: nav.screen(),
                        intent: crate::navigation::Intent::ShowProduct,
                    },
                ))
            }
        })
    }

    /// Run `f` against the navigator, logging any screen change.
    ///
    /// The lock is never held across an await.
    fn with_nav<T>(&self, f: impl FnOnce(&mut Navigator) -> T) -> T {
        let mut nav = self.nav.lock().unwrap_or_else(PoisonError::into_inner);
        let from = nav.screen();
        let out = f(&mut nav);
        let to = nav.screen();
        if from != to {
            debug!(from = %from, to = %to, "Screen changed");
        }
        out
    }
}
