//! Domain types exchanged with the pricing service.
//!
//! Field names follow the service's JSON contract; Rust-side names are
//! renamed where the wire name is vendor-specific (`amazon_price`).

use chrono::{DateTime, Utc};
use kashly_core::{OrderId, OrderStatus, PaymentMethod, Price, ProductId, ShippingAddress};
use serde::{Deserialize, Serialize};

// =============================================================================
// Quote Types
// =============================================================================

/// A priced snapshot of a catalog item.
///
/// `cod_price == base_price + commission + handling` is guaranteed by the
/// pricing service and is never recomputed here. Display fields are
/// forwarded untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductQuote {
    /// Catalog identifier (ASIN).
    pub asin: ProductId,
    pub title: String,
    #[serde(default)]
    pub images: Vec<String>,
    /// Price charged by the third-party store.
    #[serde(rename = "amazon_price")]
    pub base_price: Price,
    /// Service commission for this item.
    pub commission: Price,
    /// Flat handling fee for this item.
    #[serde(rename = "handling_fee")]
    pub handling: Price,
    /// Amount the shopper pays on delivery.
    pub cod_price: Price,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
    #[serde(default)]
    pub seller: Option<String>,
    #[serde(default = "default_availability")]
    pub availability: String,
    #[serde(default)]
    pub description: Option<String>,
}

fn default_availability() -> String {
    "In Stock".to_owned()
}

impl ProductQuote {
    /// First image, used as the thumbnail.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }
}

// =============================================================================
// Cart Types
// =============================================================================

/// A desired cart entry: one product and how many of it.
///
/// The cart store keeps quantities strictly positive; a zero quantity is
/// expressed by removing the line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "asin")]
    pub product_id: ProductId,
    pub quantity: u32,
}

impl CartLine {
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// A reconciled cart line as priced by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub asin: ProductId,
    pub quantity: u32,
    /// Quote the line was priced with.
    pub product: ProductQuote,
}

impl CartItem {
    /// The `(product, quantity)` pair this item was reconciled from.
    #[must_use]
    pub fn line(&self) -> CartLine {
        CartLine::new(self.asin.clone(), self.quantity)
    }
}

/// The authoritative cart returned by a reconciliation.
///
/// Aggregates are server-computed and only meaningful as a whole with the
/// items they were returned with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cart {
    #[serde(default)]
    pub items: Vec<CartItem>,
    pub subtotal: Price,
    pub total_commission: Price,
    pub total_handling: Price,
    #[serde(rename = "total_cod_price")]
    pub total: Price,
}

impl Cart {
    /// Re-derive the desired line list from the reconciled items, in order.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.items.iter().map(CartItem::line).collect()
    }

    /// The item for a product, if it is in the cart.
    #[must_use]
    pub fn item(&self, product_id: &ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| &item.asin == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of quantities across all lines.
    #[must_use]
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

// =============================================================================
// Order Types
// =============================================================================

/// A placed cash-on-delivery order.
///
/// Owns its own copy of the cart as submitted, so later cart edits never
/// reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub cart: Cart,
    pub shipping: ShippingAddress,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

// =============================================================================
// Service Types
// =============================================================================

/// Response of the service root endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    const PRODUCT_JSON: &str = r#"{
        "asin": "B08N5WRWNW",
        "title": "Echo Dot (4th Gen)",
        "images": ["https://images.example.com/a.jpg"],
        "amazon_price": 49.99,
        "cod_price": 59.99,
        "commission": 5.0,
        "handling_fee": 5.0,
        "rating": 4.7,
        "review_count": 45230,
        "seller": "Amazon.com",
        "availability": "In Stock",
        "description": null
    }"#;

    #[test]
    fn test_product_quote_from_service_json() {
        let quote: ProductQuote = serde_json::from_str(PRODUCT_JSON).expect("deserialize");
        assert_eq!(quote.asin, ProductId::new("B08N5WRWNW"));
        assert_eq!(quote.base_price, Price::new(dec!(49.99)));
        assert_eq!(quote.cod_price, Price::new(dec!(59.99)));
        assert_eq!(quote.handling, Price::new(dec!(5.0)));
        assert_eq!(quote.review_count, Some(45230));
        assert_eq!(quote.primary_image(), Some("https://images.example.com/a.jpg"));
    }

    #[test]
    fn test_cart_line_uses_asin_on_the_wire() {
        let line = CartLine::new(ProductId::new("X1"), 2);
        let json = serde_json::to_value(&line).expect("serialize");
        assert_eq!(json, serde_json::json!({ "asin": "X1", "quantity": 2 }));
    }

    #[test]
    fn test_cart_lines_keep_item_order() {
        let quote: ProductQuote = serde_json::from_str(PRODUCT_JSON).expect("deserialize");
        let cart = Cart {
            items: vec![
                CartItem {
                    asin: ProductId::new("B"),
                    quantity: 3,
                    product: quote.clone(),
                },
                CartItem {
                    asin: ProductId::new("A"),
                    quantity: 1,
                    product: quote,
                },
            ],
            ..Cart::default()
        };

        assert_eq!(
            cart.lines(),
            vec![
                CartLine::new(ProductId::new("B"), 3),
                CartLine::new(ProductId::new("A"), 1),
            ]
        );
        assert_eq!(cart.item_count(), 2);
        assert_eq!(cart.total_quantity(), 4);
        assert!(cart.item(&ProductId::new("A")).is_some());
    }

    #[test]
    fn test_empty_cart_defaults() {
        let cart: Cart = serde_json::from_str(
            r#"{"items": [], "subtotal": 0, "total_commission": 0, "total_handling": 0, "total_cod_price": 0}"#,
        )
        .expect("deserialize");
        assert_eq!(cart, Cart::default());
        assert!(cart.total.is_zero());
    }

    #[test]
    fn test_order_keeps_unknown_status() {
        let json = serde_json::json!({
            "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
            "cart": {"items": [], "subtotal": 0, "total_commission": 0, "total_handling": 0, "total_cod_price": 0},
            "shipping": {
                "full_name": "Ana", "phone": "1", "address_line1": "x",
                "city": "y", "state": "z", "postal_code": "0", "country": "US"
            },
            "payment_method": "COD",
            "status": "on_hold",
            "created_at": "2026-10-19T12:00:00Z",
            "updated_at": "2026-10-19T12:00:00Z"
        });
        let order: Order = serde_json::from_value(json).expect("deserialize");
        assert_eq!(order.status, OrderStatus::Other("on_hold".to_string()));
        assert_eq!(order.payment_method, PaymentMethod::CashOnDelivery);
        assert!(order.created_at.is_some());
    }
}
