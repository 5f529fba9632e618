//! Events an agent emits while working on a chat turn.

use serde_json::Value;

/// Events emitted while an agent works on a chat turn.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentEvent {
    /// A chunk of model output text.
    ChatModelStream { content: String },
    /// The agent is about to run a tool.
    ToolStart { name: String, args: Value },
    /// A tool finished.
    ToolEnd { name: String, output: String },
}

impl AgentEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::ChatModelStream { .. } => "chat_model_stream",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolEnd { .. } => "tool_end",
        }
    }
}
