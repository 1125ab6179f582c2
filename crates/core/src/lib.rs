//! Kashly Core - Shared types library.
//!
//! This crate provides common types used across all Kashly components:
//! - `storefront` - Pricing service client, cart store and navigation state
//! - `cli` - Interactive terminal shopper
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, product URLs, addresses and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
