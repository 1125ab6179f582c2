//! Order status lookup.
//!
//! # Usage
//!
//! ```bash
//! kashly order 0f8fad5b-d9cb-469f-a165-70867728950e
//! ```

use kashly_core::OrderId;
use kashly_storefront::config::StorefrontConfig;

use super::shop::render_order;
use super::{CommandError, client};

/// Fetch an order and print its status and totals.
///
/// # Errors
///
/// Returns an error if the order is unknown or the service cannot be reached.
pub async fn show(config: &StorefrontConfig, id: &str) -> Result<(), CommandError> {
    let order = client(config)?.get_order(&OrderId::new(id.trim())).await?;

    #[allow(clippy::print_stdout)]
    {
        println!("{}", render_order(&order));
    }

    Ok(())
}
