//! Streaming chat endpoint.
//!
//! `POST /api/v1/agents/chat` builds an agent for the request and relays its
//! events as Server-Sent Events. Every stream ends with a `[DONE]` frame, even
//! when the agent fails part way through.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::stream::{Stream, StreamExt};
use uuid::Uuid;

use crate::agent::{AgentEvent, AgentEventStream, AgentSpec};
use crate::llm::ChatMessage;

use super::routes::AppState;
use super::types::{ChatRequest, ErrorDetail, StreamFrame};

/// Error response for failures before the stream starts.
pub type ApiError = (StatusCode, Json<ErrorDetail>);

/// Sentinel payload of the last frame.
pub const DONE: &str = "[DONE]";

/// Status shown while a tool runs.
pub const TOOL_STATUS: &str = "Checking weather...";

/// Rebuild the conversation: prior turns, then the new user message.
pub fn build_messages(request: &ChatRequest) -> Vec<ChatMessage> {
    let history = request.history.as_deref().unwrap_or_default();
    let mut messages = Vec::with_capacity(history.len() + 1);

    for entry in history {
        match entry.role.as_str() {
            "user" => messages.push(ChatMessage::user(entry.content.clone())),
            "assistant" => messages.push(ChatMessage::assistant(entry.content.clone())),
            other => tracing::debug!(role = %other, "Skipping history entry with unknown role"),
        }
    }

    messages.push(ChatMessage::user(request.message.clone()));
    messages
}

/// POST /api/v1/agents/chat - Chat with an agent, streamed as SSE.
pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let messages = build_messages(&request);

    let agent = state
        .agent_factory
        .create_agent(AgentSpec {
            api_key: &request.config.api_key,
            model_name: &request.config.model_name,
            system_prompt: &request.config.system_prompt,
            tools: &request.config.tools,
        })
        .map_err(|e| {
            tracing::error!(
                error = %e,
                model = %request.config.model_name,
                "Failed to create agent"
            );
            internal_error(e)
        })?;

    let stream_id = Uuid::new_v4();
    tracing::info!(
        stream_id = %stream_id,
        model = %request.config.model_name,
        history_len = messages.len() - 1,
        "Chat stream opened"
    );

    let events = agent.stream_events(messages);
    let sse = relay_frames(stream_id, events).map(|data| Ok(Event::default().data(data)));

    Ok(Sse::new(sse).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keepalive"),
    ))
}

/// Translate agent events into SSE `data:` payloads, ending with [`DONE`].
pub fn relay_frames(stream_id: Uuid, mut events: AgentEventStream) -> impl Stream<Item = String> {
    async_stream::stream! {
        while let Some(event) = events.next().await {
            let frame = match event {
                Ok(AgentEvent::ChatModelStream { content }) => {
                    if content.is_empty() {
                        continue;
                    }
                    StreamFrame::content(content)
                }
                Ok(AgentEvent::ToolStart { name, .. }) => {
                    tracing::debug!(stream_id = %stream_id, tool = %name, "Tool started");
                    StreamFrame::status(TOOL_STATUS)
                }
                Ok(AgentEvent::ToolEnd { name, .. }) => {
                    tracing::debug!(stream_id = %stream_id, tool = %name, "Tool finished");
                    continue;
                }
                Err(e) => {
                    tracing::error!(stream_id = %stream_id, error = %e, "Agent stream failed");
                    let frame = StreamFrame::content(format!("Error: {}", e));
                    if let Some(data) = encode(stream_id, &frame) {
                        yield data;
                    }
                    break;
                }
            };

            if let Some(data) = encode(stream_id, &frame) {
                yield data;
            }
        }

        tracing::info!(stream_id = %stream_id, "Chat stream closed");
        yield DONE.to_string();
    }
}

fn encode(stream_id: Uuid, frame: &StreamFrame) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(data) => Some(data),
        Err(e) => {
            tracing::error!(
                stream_id = %stream_id,
                error = %e,
                "Failed to serialize SSE frame; dropping"
            );
            None
        }
    }
}

fn internal_error(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorDetail {
            detail: e.to_string(),
        }),
    )
}
