//! Core types for Kashly.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod id;
pub mod price;
pub mod product_url;
pub mod status;

pub use address::{AddressError, AddressField, FieldError, ShippingAddress};
pub use id::*;
pub use price::Price;
pub use product_url::{ProductUrl, ProductUrlError};
pub use status::*;
