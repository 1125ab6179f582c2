//! Kashly shopper library.
//!
//! Keeps a shopper's cart and screen in sync with the remote pricing
//! service that quotes cash-on-delivery prices and accepts orders.
//!
//! - [`pricing`]: service contract, HTTP client and wire types
//! - [`cart`]: cart store reconciling every change with the service
//! - [`navigation`]: screen state machine
//! - [`session`]: the [`Shop`] session tying them together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod config;
pub mod error;
pub mod navigation;
pub mod pricing;
pub mod session;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod testing;

pub use error::{Operation, Result, ShopError};
pub use session::{Notice, Shop};
