//! HTTP routing and shared state.

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::agent::AgentFactory;
use crate::config::Config;

use super::chat;
use super::types::HealthResponse;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub agent_factory: Arc<dyn AgentFactory>,
}

impl AppState {
    pub fn new(config: Config, agent_factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            config,
            agent_factory,
        }
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    let agents = Router::new().route("/chat", post(chat::chat));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1/agents", agents)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Liveness probe.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// CORS policy. Origins are mirrored rather than wildcarded so that
/// credentialed requests keep working.
fn cors_layer(config: &Config) -> CorsLayer {
    let origin = match &config.cors_origins {
        None => AllowOrigin::mirror_request(),
        Some(origins) => {
            let values: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        tracing::warn!(origin = %o, error = %e, "Ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            AllowOrigin::list(values)
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
