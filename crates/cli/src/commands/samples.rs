//! Demonstration catalog listing.
//!
//! # Usage
//!
//! ```bash
//! # Identifiers only
//! kashly samples
//!
//! # With live quotes
//! kashly samples --quotes
//! ```

use kashly_storefront::config::StorefrontConfig;
use kashly_storefront::pricing::{PricingService, sample_products};

use super::{CommandError, client};

/// Print the sample identifiers, optionally with a quote for each.
///
/// A failed quote is reported on its line and does not stop the listing.
///
/// # Errors
///
/// Returns an error only if the client cannot be built.
#[allow(clippy::print_stdout)]
pub async fn run(config: &StorefrontConfig, quotes: bool) -> Result<(), CommandError> {
    if !quotes {
        for product_id in sample_products() {
            println!("{product_id}");
        }
        return Ok(());
    }

    let client = client(config)?;
    for product_id in sample_products() {
        match client.fetch_sample(&product_id).await {
            Ok(quote) => println!(
                "{product_id}  {}  {} on delivery",
                quote.title, quote.cod_price
            ),
            Err(e) => println!("{product_id}  unavailable: {e}"),
        }
    }

    Ok(())
}
