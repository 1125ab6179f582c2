//! Kashly CLI - terminal shopper for the cash-on-delivery pricing service.
//!
//! # Usage
//!
//! ```bash
//! # Interactive shopping session
//! kashly shop
//!
//! # List the demonstration catalog, with live quotes
//! kashly samples --quotes
//!
//! # Check an order's status
//! kashly order 0f8fad5b-d9cb-469f-a165-70867728950e
//!
//! # Check that the pricing service is reachable
//! kashly ping
//! ```
//!
//! # Commands
//!
//! - `shop` - Interactive session: look up products, edit the cart, order
//! - `samples` - Demonstration catalog identifiers
//! - `order` - Fetch an order by id
//! - `ping` - Service name and version

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use kashly_storefront::config::StorefrontConfig;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "kashly")]
#[command(author, version, about = "Cash-on-delivery shopping from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start an interactive shopping session
    Shop,
    /// List the demonstration catalog
    Samples {
        /// Fetch a live quote for each sample
        #[arg(short, long)]
        quotes: bool,
    },
    /// Show an order's status
    Order {
        /// Order id returned when the order was placed
        id: String,
    },
    /// Check that the pricing service is reachable
    Ping,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load configuration first: Sentry must be initialized before tracing
    let config = StorefrontConfig::from_env();
    let sentry_guard = config.as_ref().ok().and_then(init_sentry);

    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "kashly_cli=info,kashly_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    if sentry_guard.is_some() {
        tracing::info!("Sentry initialized");
    }

    let result: Result<(), Box<dyn std::error::Error>> = run(cli, &config).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &StorefrontConfig) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Shop => commands::shop::run(config).await?,
        Commands::Samples { quotes } => commands::samples::run(config, quotes).await?,
        Commands::Order { id } => commands::order::show(config, &id).await?,
        Commands::Ping => commands::ping::run(config).await?,
    }
    Ok(())
}
