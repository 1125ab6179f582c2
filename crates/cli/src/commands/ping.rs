//! Service reachability check.
//!
//! # Usage
//!
//! ```bash
//! kashly ping
//! ```

use kashly_storefront::config::StorefrontConfig;

use super::{CommandError, client};

/// Print the service name and version.
///
/// # Errors
///
/// Returns an error if the service cannot be reached.
pub async fn run(config: &StorefrontConfig) -> Result<(), CommandError> {
    let info = client(config)?.ping().await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{} {} at {}",
            info.message,
            info.version.as_deref().unwrap_or("(unknown version)"),
            config.pricing.base_url
        );
    }

    Ok(())
}
