//! Chat model abstraction.
//!
//! The agent talks to a model through [`ChatModel`]: given the conversation
//! and the tools on offer, stream back text and function calls.

mod gemini;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde_json::Value;
use thiserror::Error;

use crate::tools::ToolSchema;

pub use gemini::GeminiClient;

/// Errors raised by a chat model client.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Model name is required")]
    MissingModel,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Model API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Model stream failed: {0}")]
    Stream(String),

    #[error("Failed to decode model response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Role of a message in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
    Tool,
}

/// A tool invocation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
    /// Opaque provider token that must be echoed back with the call.
    pub signature: Option<String>,
}

/// A message in the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: Option<String>,
    /// Set on assistant messages that requested tools.
    pub tool_calls: Option<Vec<ToolCall>>,
    /// Set on tool result messages: the tool that produced the content.
    pub tool_name: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: Some(content.into()),
            tool_calls: None,
            tool_name: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: Some(content.into()),
            tool_calls: None,
            tool_name: None,
        }
    }

    pub fn assistant_tool_calls(content: Option<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            role: Role::Assistant,
            content,
            tool_calls: Some(calls),
            tool_name: None,
        }
    }

    pub fn tool_result(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            content: Some(content.into()),
            tool_calls: None,
            tool_name: Some(name.into()),
        }
    }
}

/// One increment of a streamed model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelChunk {
    Text(String),
    FunctionCall(ToolCall),
}

/// Everything a model needs for one call.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub system_prompt: Option<&'a str>,
    pub messages: &'a [ChatMessage],
    pub tools: &'a [ToolSchema],
}

/// A streaming chat model.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logging.
    fn model_name(&self) -> &str;

    /// Start a streamed completion.
    async fn stream_chat(
        &self,
        request: ChatRequest<'_>,
    ) -> Result<BoxStream<'static, Result<ModelChunk, LlmError>>, LlmError>;
}
