//! Pricing service contract and HTTP client.
//!
//! # Architecture
//!
//! - The pricing service is the source of truth for quotes, cart totals and
//!   orders. Nothing here computes a fee or a total.
//! - [`PricingService`] is the four-operation contract the cart store and
//!   session are generic over; [`PricingClient`] implements it over JSON/HTTP.
//! - Demonstration catalog quotes are cached in memory via `moka`.
//!
//! # Example
//!
//! ```rust,ignore
//! use kashly_storefront::pricing::{PricingClient, PricingService};
//!
//! let client = PricingClient::new(&config.pricing)?;
//!
//! let quote = client.lookup(&ProductUrl::parse(url)?).await?;
//! let cart = client
//!     .reconcile_cart(&[CartLine::new(quote.asin.clone(), 1)])
//!     .await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::PricingClient;
pub use types::*;

use async_trait::async_trait;
use kashly_core::{AddressError, FieldError, ProductId, ProductUrl, ProductUrlError, ShippingAddress};
use thiserror::Error;

/// Identifiers of the fixed demonstration catalog offered on the search screen.
pub const SAMPLE_PRODUCTS: [&str; 3] = ["B08N5WRWNW", "B0C1SLD1PZ", "B0BDJ6M6JZ"];

/// The demonstration catalog as typed ids.
#[must_use]
pub fn sample_products() -> Vec<ProductId> {
    SAMPLE_PRODUCTS.into_iter().map(ProductId::from).collect()
}

// =============================================================================
// Errors
// =============================================================================

/// Failure of a single pricing service call.
///
/// Exactly one of these is surfaced per failed call. None of them is fatal;
/// the caller's prior state is always left intact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PricingError {
    /// Malformed input, caught before or rejected by the service.
    #[error("Invalid request: {0}")]
    Invalid(String),

    /// The service could not resolve an identifier or URL.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The service rejected structured input.
    #[error("Validation failed: {}", format_field_errors(.0))]
    ValidationFailed(Vec<FieldError>),

    /// Transport, timeout or server fault.
    #[error("Pricing service unavailable: {0}")]
    Unavailable(String),
}

impl PricingError {
    /// Coarse classification for user display.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::Unavailable(_) => ErrorClass::Network,
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::Invalid(_) | Self::ValidationFailed(_) => ErrorClass::Validation,
        }
    }

    /// Field errors carried by a validation failure.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::ValidationFailed(fields) => fields.as_slice(),
            _ => &[],
        }
    }
}

impl From<reqwest::Error> for PricingError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Unavailable("request timed out".to_string())
        } else {
            Self::Unavailable(err.to_string())
        }
    }
}

impl From<ProductUrlError> for PricingError {
    fn from(err: ProductUrlError) -> Self {
        Self::Invalid(err.to_string())
    }
}

impl From<AddressError> for PricingError {
    fn from(err: AddressError) -> Self {
        Self::ValidationFailed(err.field_errors())
    }
}

/// Error classification shown to the shopper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    Network,
    Validation,
    NotFound,
}

impl ErrorClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Validation => "validation",
            Self::NotFound => "not-found",
        }
    }
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn format_field_errors(errors: &[FieldError]) -> String {
    if errors.is_empty() {
        return "(no field details provided)".to_string();
    }

    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Contract
// =============================================================================

/// The remote pricing service, as seen by the cart store and session.
///
/// Every operation is a single request/response round trip. Implementations
/// must not retry.
#[async_trait]
pub trait PricingService: Send + Sync {
    /// Resolve a pasted product URL into a quote.
    async fn lookup(&self, url: &ProductUrl) -> Result<ProductQuote, PricingError>;

    /// Fetch a quote for a demonstration catalog item.
    async fn fetch_sample(&self, product_id: &ProductId) -> Result<ProductQuote, PricingError>;

    /// Price the complete desired line list and return the authoritative cart.
    async fn reconcile_cart(&self, lines: &[CartLine]) -> Result<Cart, PricingError>;

    /// Submit a cart for cash-on-delivery shipping to `shipping`.
    async fn place_order(
        &self,
        cart: &Cart,
        shipping: &ShippingAddress,
    ) -> Result<Order, PricingError>;
}
