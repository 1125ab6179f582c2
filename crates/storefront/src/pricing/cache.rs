//! Cache for demonstration catalog quotes.
//!
//! Only sample quotes are cached. Lookups, carts and orders always go to the
//! service.

use std::time::Duration;

use kashly_core::ProductId;
use moka::future::Cache;

use super::types::ProductQuote;

const MAX_SAMPLE_ENTRIES: u64 = 100;

/// Sample quotes keyed by catalog id.
pub type SampleCache = Cache<ProductId, ProductQuote>;

/// Build a sample cache whose entries expire after `ttl`.
pub fn sample_cache(ttl: Duration) -> SampleCache {
    Cache::builder()
        .max_capacity(MAX_SAMPLE_ENTRIES)
        .time_to_live(ttl)
        .build()
}
