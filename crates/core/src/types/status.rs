//! Status enums for orders and payment.

use serde::{Deserialize, Serialize};

/// Order status as reported by the pricing service.
///
/// The vocabulary is open-ended: tags this client does not know about are
/// kept verbatim in [`OrderStatus::Other`] so they round-trip unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
    Other(String),
}

impl OrderStatus {
    /// The wire tag for this status.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
            Self::Other(tag) => tag,
        }
    }
}

impl From<String> for OrderStatus {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "pending" => Self::Pending,
            "confirmed" => Self::Confirmed,
            "shipped" => Self::Shipped,
            "delivered" => Self::Delivered,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(tag),
        }
    }
}

impl From<OrderStatus> for String {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Other(tag) => tag,
            known => known.as_str().to_owned(),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method for an order.
///
/// Kashly only supports cash on delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    #[serde(rename = "COD")]
    CashOnDelivery,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CashOnDelivery => write!(f, "cash on delivery"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_known_tags() {
        let status: OrderStatus = serde_json::from_str("\"pending\"").expect("deserialize");
        assert_eq!(status, OrderStatus::Pending);
        assert_eq!(
            serde_json::to_string(&OrderStatus::Shipped).expect("serialize"),
            "\"shipped\""
        );
    }

    #[test]
    fn test_order_status_unknown_tag_round_trips() {
        let status: OrderStatus =
            serde_json::from_str("\"awaiting_pickup\"").expect("deserialize");
        assert_eq!(status, OrderStatus::Other("awaiting_pickup".to_string()));
        assert_eq!(
            serde_json::to_string(&status).expect("serialize"),
            "\"awaiting_pickup\""
        );
    }

    #[test]
    fn test_payment_method_wire_value() {
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).expect("serialize"),
            "\"COD\""
        );
        assert_eq!(PaymentMethod::CashOnDelivery.to_string(), "cash on delivery");
    }
}
