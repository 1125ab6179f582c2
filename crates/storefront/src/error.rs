//! Unified error type for shopper sessions.
//!
//! Every session and cart store operation returns [`ShopError`]. Nothing in
//! it is fatal: the session stays usable and its prior state intact.

use std::fmt;

use thiserror::Error;

use crate::navigation::NavigationError;
use crate::pricing::{ErrorClass, PricingError};

/// Result alias for session and cart store operations.
pub type Result<T> = std::result::Result<T, ShopError>;

/// A long-running operation that may only have one call in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// URL lookup or sample fetch.
    Lookup,
    PlaceOrder,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lookup => "product lookup",
            Self::PlaceOrder => "order placement",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Session-level error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShopError {
    /// A pricing service call failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Checkout or order placement with nothing in the cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// The intent is not allowed from the current screen.
    #[error("Invalid transition: {0}")]
    InvalidTransition(#[from] NavigationError),

    /// The same operation is already in flight.
    #[error("A {0} is already in progress")]
    AlreadyPending(Operation),
}

impl ShopError {
    /// Coarse classification for user display.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Pricing(err) => err.class(),
            Self::EmptyCart | Self::InvalidTransition(_) | Self::AlreadyPending(_) => {
                ErrorClass::Validation
            }
        }
    }

    /// Message suitable for showing to the shopper.
    ///
    /// Server-provided detail is forwarded verbatim when present.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Pricing(PricingError::Invalid(detail) | PricingError::NotFound(detail)) => {
                detail.clone()
            }
            Self::Pricing(PricingError::ValidationFailed(fields)) if !fields.is_empty() => {
                let names: Vec<&str> = fields.iter().map(|f| f.field.as_str()).collect();
                format!("Please check: {}", names.join(", "))
            }
            Self::Pricing(PricingError::ValidationFailed(_)) => {
                "Please check your details and try again".to_string()
            }
            Self::Pricing(PricingError::Unavailable(_)) => {
                "Could not reach the pricing service. Please try again.".to_string()
            }
            Self::EmptyCart => "Your cart is empty".to_string(),
            Self::InvalidTransition(err) => format!("Not available here: {}", err.intent),
            Self::AlreadyPending(op) => format!("Please wait, {op} in progress"),
        }
    }
}
