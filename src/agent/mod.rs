//! Agent module - the tool-using chat agent.
//!
//! The agent follows a "tools in a loop" pattern:
//! 1. Send the conversation and the enabled tools to the model
//! 2. Stream the model's text out as it arrives
//! 3. If the model requests tool calls, execute them and feed the results back
//! 4. Repeat until the model answers without tool calls or max iterations is reached

mod agent_loop;
mod events;
mod factory;

use futures::stream::BoxStream;

use crate::llm::ChatMessage;

pub use agent_loop::ReactAgent;
pub use events::AgentEvent;
pub use factory::{AgentFactory, AgentSpec, GeminiAgentFactory};

/// Stream of events for one chat turn. Ends after the final answer or on the first error.
pub type AgentEventStream = BoxStream<'static, anyhow::Result<AgentEvent>>;

/// A runnable agent.
pub trait Agent: Send + Sync {
    /// Run the agent over a conversation, streaming what it does.
    fn stream_events(&self, messages: Vec<ChatMessage>) -> AgentEventStream;
}
