//! TelePulse - Telegram channel analytics pipeline.
//!
//! Command-line entry point. Dispatches to the pipeline orchestrator,
//! the individual stage commands, or the analytics API server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use telepulse::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "telepulse=info"
    } else {
        "telepulse=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Run CLI
    cli::run().await
}
