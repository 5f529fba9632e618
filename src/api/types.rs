//! API request and response types.

use serde::{Deserialize, Serialize};

/// Agent settings sent with every chat request.
#[derive(Clone, Deserialize)]
pub struct AgentConfig {
    /// Model identifier, e.g. `gemini-2.0-flash`
    pub model_name: String,

    /// Provider API key
    pub api_key: String,

    /// System prompt for the agent
    pub system_prompt: String,

    /// Names of the tools the agent may call
    #[serde(default)]
    pub tools: Vec<String>,
}

// Keep the API key out of logs.
impl std::fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentConfig")
            .field("model_name", &self.model_name)
            .field("api_key", &"<redacted>")
            .field("system_prompt", &self.system_prompt)
            .field("tools", &self.tools)
            .finish()
    }
}

/// A prior turn of the conversation.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryMessage {
    /// `user` or `assistant`; other roles are skipped
    pub role: String,

    pub content: String,
}

/// Request to chat with an agent.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    /// The new user message
    pub message: String,

    /// Agent settings
    pub config: AgentConfig,

    /// Conversation so far, oldest first
    #[serde(default)]
    pub history: Option<Vec<HistoryMessage>>,
}

/// Payload of one SSE `data:` frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StreamFrame {
    /// Tool invocation notice.
    Status {
        r#type: &'static str,
        content: String,
    },
    /// Token or error text.
    Content { content: String },
}

impl StreamFrame {
    pub fn content(content: impl Into<String>) -> Self {
        Self::Content {
            content: content.into(),
        }
    }

    pub fn status(content: impl Into<String>) -> Self {
        Self::Status {
            r#type: "status",
            content: content.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
}

/// Error body for failures before streaming starts.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn frames_serialize_to_wire_shape() {
        assert_eq!(
            serde_json::to_value(StreamFrame::content("Hi")).unwrap(),
            json!({"content": "Hi"})
        );
        assert_eq!(
            serde_json::to_value(StreamFrame::status("Checking weather...")).unwrap(),
            json!({"type": "status", "content": "Checking weather..."})
        );
    }

    #[test]
    fn request_defaults_tools_and_history() {
        let request: ChatRequest = serde_json::from_value(json!({
            "message": "hi",
            "config": {
                "model_name": "gemini-2.0-flash",
                "api_key": "k",
                "system_prompt": "Be kind."
            }
        }))
        .unwrap();

        assert!(request.config.tools.is_empty());
        assert!(request.history.is_none());
    }

    #[test]
    fn history_entries_ignore_extra_fields() {
        let request: ChatRequest = serde_json::from_value(json!({
            "message": "again",
            "config": {
                "model_name": "gemini-2.0-flash",
                "api_key": "k",
                "system_prompt": "",
                "tools": ["get_weather"]
            },
            "history": [
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello", "status": "Checking weather..."}
            ]
        }))
        .unwrap();

        let history = request.history.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, "assistant");
    }

    #[test]
    fn missing_config_is_rejected() {
        let result = serde_json::from_value::<ChatRequest>(json!({"message": "hi"}));
        assert!(result.is_err());
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = AgentConfig {
            model_name: "m".to_string(),
            api_key: "secret-key".to_string(),
            system_prompt: String::new(),
            tools: vec![],
        };
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret-key"));
        assert!(rendered.contains("<redacted>"));
    }
}
