//! HTTP API.
//!
//! - `GET /health`
//! - `POST /api/v1/agents/chat` (SSE)

pub mod chat;
pub mod routes;
pub mod types;

use std::sync::Arc;

use crate::agent::GeminiAgentFactory;
use crate::config::Config;

use routes::AppState;

/// Start the HTTP server and run until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("agent-builder/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let factory = Arc::new(GeminiAgentFactory::new(http, config.clone()));
    let addr = config.bind_addr();
    let state = Arc::new(AppState::new(config, factory));
    let app = routes::router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Starting server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        // Without a signal handler, keep serving.
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
