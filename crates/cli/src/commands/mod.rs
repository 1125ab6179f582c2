//! CLI subcommands.

pub mod order;
pub mod ping;
pub mod samples;
pub mod shop;

use kashly_storefront::config::StorefrontConfig;
use kashly_storefront::pricing::{PricingClient, PricingError};
use thiserror::Error;

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The pricing service call failed.
    #[error(transparent)]
    Pricing(#[from] PricingError),

    /// Reading from or writing to the terminal failed.
    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the pricing service client from configuration.
fn client(config: &StorefrontConfig) -> Result<PricingClient, CommandError> {
    tracing::debug!(base_url = %config.pricing.base_url, "Connecting to pricing service");
    Ok(PricingClient::new(&config.pricing)?)
}
