//! Agent Builder - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the streaming chat API.

use agent_builder::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agent_builder=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        max_iterations = config.max_iterations,
        temperature = config.temperature,
        "Loaded configuration"
    );

    // Start HTTP server
    api::serve(config).await?;

    Ok(())
}
