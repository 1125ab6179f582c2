//! Screen navigation state machine.
//!
//! Exactly one [`View`] is live at a time. Transitions are driven only by
//! shopper intents and remote call outcomes; nothing here performs I/O.

use std::fmt;

use thiserror::Error;

use crate::pricing::{Order, ProductQuote};

/// The live screen and the data it holds.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum View {
    /// URL entry and sample catalog.
    #[default]
    Searching,
    /// A quoted product.
    ViewingProduct(Box<ProductQuote>),
    ViewingCart,
    /// Shipping address entry.
    CheckingOut,
    /// A placed order.
    OrderComplete(Box<Order>),
}

impl View {
    #[must_use]
    pub const fn screen(&self) -> Screen {
        match self {
            Self::Searching => Screen::Search,
            Self::ViewingProduct(_) => Screen::Product,
            Self::ViewingCart => Screen::Cart,
            Self::CheckingOut => Screen::Checkout,
            Self::OrderComplete(_) => Screen::Success,
        }
    }

    /// The product being viewed, if any.
    #[must_use]
    pub fn product(&self) -> Option<&ProductQuote> {
        match self {
            Self::ViewingProduct(quote) => Some(&**quote),
            _ => None,
        }
    }

    /// The completed order, if any.
    #[must_use]
    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::OrderComplete(order) => Some(&**order),
            _ => None,
        }
    }
}

/// Stable screen names used in logs and breadcrumbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Search,
    Product,
    Cart,
    Checkout,
    Success,
}

impl Screen {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Product => "product",
            Self::Cart => "cart",
            Self::Checkout => "checkout",
            Self::Success => "success",
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shopper intent that may change the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    ShowProduct,
    OpenCart,
    OpenSearch,
    Checkout,
    CompleteOrder,
    ContinueShopping,
}

impl Intent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShowProduct => "show product",
            Self::OpenCart => "open cart",
            Self::OpenSearch => "open search",
            Self::Checkout => "checkout",
            Self::CompleteOrder => "complete order",
            Self::ContinueShopping => "continue shopping",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An intent that is not allowed from the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot {intent} from the {from} screen")]
pub struct NavigationError {
    pub from: Screen,
    pub intent: Intent,
}

/// Owns the live [`View`] and applies transitions to it.
///
/// A rejected transition leaves the view untouched.
#[derive(Debug, Default)]
pub struct Navigator {
    view: View,
}

impl Navigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn view(&self) -> &View {
        &self.view
    }

    #[must_use]
    pub const fn screen(&self) -> Screen {
        self.view.screen()
    }

    /// Whether a lookup result may be shown right now.
    #[must_use]
    pub const fn accepts_product(&self) -> bool {
        matches!(self.view, View::Searching | View::ViewingProduct(_))
    }

    /// Show a freshly quoted product.
    ///
    /// # Errors
    ///
    /// Rejected unless searching or already viewing a product.
    pub fn show_product(&mut self, quote: ProductQuote) -> Result<(), NavigationError> {
        self.ensure(Intent::ShowProduct, self.accepts_product())?;
        self.view = View::ViewingProduct(Box::new(quote));
        Ok(())
    }

    /// Open the cart from any screen.
    pub fn open_cart(&mut self) {
        self.view = View::ViewingCart;
    }

    /// Return to search from any screen, dropping any held product or order.
    pub fn open_search(&mut self) {
        self.view = View::Searching;
    }

    /// Move from the cart to address entry.
    ///
    /// # Errors
    ///
    /// Rejected unless viewing the cart.
    pub fn checkout(&mut self) -> Result<(), NavigationError> {
        self.ensure(Intent::Checkout, matches!(self.view, View::ViewingCart))?;
        self.view = View::CheckingOut;
        Ok(())
    }

    /// Check that an order may be placed from the current screen.
    ///
    /// # Errors
    ///
    /// Rejected unless checking out.
    pub fn ensure_checking_out(&self) -> Result<(), NavigationError> {
        self.ensure(
            Intent::CompleteOrder,
            matches!(self.view, View::CheckingOut),
        )
    }

    /// Show a placed order.
    ///
    /// Always succeeds: once the service has accepted an order it is shown
    /// even if the shopper navigated away while it was in flight.
    pub fn complete_order(&mut self, order: Order) {
        self.view = View::OrderComplete(Box::new(order));
    }

    /// Leave the success screen for a fresh search.
    ///
    /// # Errors
    ///
    /// Rejected unless an order was just completed.
    pub fn continue_shopping(&mut self) -> Result<(), NavigationError> {
        self.ensure(
            Intent::ContinueShopping,
            matches!(self.view, View::OrderComplete(_)),
        )?;
        self.view = View::Searching;
        Ok(())
    }

    const fn ensure(&self, intent: Intent, allowed: bool) -> Result<(), NavigationError> {
        if allowed {
            Ok(())
        } else {
            Err(NavigationError {
                from: self.view.screen(),
                intent,
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use kashly_core::{OrderId, ProductId, ShippingAddress};

    use super::*;
    use crate::pricing::Cart;

    fn quote(asin: &str) -> ProductQuote {
        serde_json::from_value(serde_json::json!({
            "asin": asin,
            "title": "Kindle Paperwhite",
            "amazon_price": 139.99,
            "cod_price": 158.99,
            "commission": 14.0,
            "handling_fee": 5.0
        }))
        .unwrap()
    }

    fn order() -> Order {
        Order {
            id: OrderId::new("0f8fad5b-d9cb-469f-a165-70867728950e"),
            cart: Cart::default(),
            shipping: ShippingAddress::default(),
            payment_method: kashly_core::PaymentMethod::CashOnDelivery,
            status: kashly_core::OrderStatus::Pending,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_starts_searching() {
        let nav = Navigator::new();
        assert_eq!(nav.view(), &View::Searching);
        assert_eq!(nav.screen().as_str(), "search");
    }

    #[test]
    fn test_full_purchase_path() {
        let mut nav = Navigator::new();
        nav.show_product(quote("B0BDJ6M6JZ")).unwrap();
        assert_eq!(
            nav.view().product().map(|q| &q.asin),
            Some(&ProductId::new("B0BDJ6M6JZ"))
        );

        nav.open_cart();
        nav.checkout().unwrap();
        assert_eq!(nav.screen(), Screen::Checkout);

        nav.complete_order(order());
        assert_eq!(nav.screen(), Screen::Success);
        assert!(nav.view().order().is_some());

        nav.continue_shopping().unwrap();
        assert_eq!(nav.view(), &View::Searching);
        assert!(nav.view().product().is_none());
        assert!(nav.view().order().is_none());
    }

    #[test]
    fn test_product_replaces_product() {
        let mut nav = Navigator::new();
        nav.show_product(quote("A")).unwrap();
        nav.show_product(quote("B")).unwrap();
        assert_eq!(
            nav.view().product().map(|q| q.asin.as_str()),
            Some("B")
        );
    }

    #[test]
    fn test_product_rejected_outside_search() {
        let mut nav = Navigator::new();
        nav.open_cart();
        let err = nav.show_product(quote("A")).unwrap_err();
        assert_eq!(
            err,
            NavigationError {
                from: Screen::Cart,
                intent: Intent::ShowProduct
            }
        );
        assert_eq!(nav.view(), &View::ViewingCart);
    }

    #[test]
    fn test_checkout_only_from_cart() {
        let mut nav = Navigator::new();
        let err = nav.checkout().unwrap_err();
        assert_eq!(err.to_string(), "cannot checkout from the search screen");
        assert_eq!(nav.screen(), Screen::Search);
    }

    #[test]
    fn test_order_placement_requires_checkout() {
        let mut nav = Navigator::new();
        nav.open_cart();
        let err = nav.ensure_checking_out().unwrap_err();
        assert_eq!(err.intent, Intent::CompleteOrder);
        assert_eq!(nav.screen(), Screen::Cart);
    }

    #[test]
    fn test_continue_only_after_order() {
        let mut nav = Navigator::new();
        nav.open_cart();
        assert!(nav.continue_shopping().is_err());
        assert_eq!(nav.screen(), Screen::Cart);
    }

    #[test]
    fn test_cart_and_search_reachable_from_anywhere() {
        let mut nav = Navigator::new();
        nav.open_cart();
        nav.checkout().unwrap();
        nav.open_cart();
        assert_eq!(nav.screen(), Screen::Cart);

        nav.checkout().unwrap();
        nav.complete_order(order());
        nav.open_search();
        assert_eq!(nav.view(), &View::Searching);
    }
}
