//! Core agent loop implementation.

use std::sync::Arc;

use futures::StreamExt;

use crate::llm::{ChatMessage, ChatModel, ChatRequest, ModelChunk};
use crate::tools::ToolRegistry;

use super::{Agent, AgentEvent, AgentEventStream};

/// A reactive agent: call the model, run what it asks for, repeat.
pub struct ReactAgent {
    model: Arc<dyn ChatModel>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_iterations: usize,
}

impl ReactAgent {
    /// Create a new agent.
    pub fn new(
        model: Arc<dyn ChatModel>,
        tools: ToolRegistry,
        system_prompt: impl Into<String>,
        max_iterations: usize,
    ) -> Self {
        Self {
            model,
            tools: Arc::new(tools),
            system_prompt: system_prompt.into(),
            max_iterations,
        }
    }
}

impl Agent for ReactAgent {
    fn stream_events(&self, messages: Vec<ChatMessage>) -> AgentEventStream {
        let model = Arc::clone(&self.model);
        let tools = Arc::clone(&self.tools);
        let system_prompt = self.system_prompt.clone();
        let max_iterations = self.max_iterations;

        let stream = async_stream::stream! {
            let mut messages = messages;
            let schemas = tools.schemas();

            for iteration in 0..max_iterations {
                tracing::debug!(
                    model = %model.model_name(),
                    iteration = iteration + 1,
                    "Agent iteration"
                );

                let request = ChatRequest {
                    system_prompt: Some(&system_prompt),
                    messages: &messages,
                    tools: &schemas,
                };
                let mut chunks = match model.stream_chat(request).await {
                    Ok(chunks) => chunks,
                    Err(e) => {
                        yield Err(anyhow::Error::from(e));
                        return;
                    }
                };

                let mut text = String::new();
                let mut calls = Vec::new();
                while let Some(chunk) = chunks.next().await {
                    match chunk {
                        Ok(ModelChunk::Text(delta)) => {
                            text.push_str(&delta);
                            yield Ok(AgentEvent::ChatModelStream { content: delta });
                        }
                        Ok(ModelChunk::FunctionCall(call)) => calls.push(call),
                        Err(e) => {
                            yield Err(anyhow::Error::from(e));
                            return;
                        }
                    }
                }

                // No tool calls - this is the final response
                if calls.is_empty() {
                    return;
                }

                let content = if text.is_empty() { None } else { Some(text) };
                messages.push(ChatMessage::assistant_tool_calls(content, calls.clone()));

                for call in calls {
                    yield Ok(AgentEvent::ToolStart {
                        name: call.name.clone(),
                        args: call.arguments.clone(),
                    });

                    tracing::info!(tool = %call.name, args = %call.arguments, "Calling tool");
                    let output = match tools.execute(&call.name, call.arguments.clone()).await {
                        Ok(output) => output,
                        Err(e) => format!("Error: {}", e),
                    };
                    tracing::debug!(
                        tool = %call.name,
                        output = %truncate_for_log(&output, 1000),
                        "Tool finished"
                    );

                    yield Ok(AgentEvent::ToolEnd {
                        name: call.name.clone(),
                        output: output.clone(),
                    });
                    messages.push(ChatMessage::tool_result(call.name, output));
                }
            }

            yield Err(anyhow::anyhow!(
                "Recursion limit of {} reached without a final answer",
                max_iterations
            ));
        };

        Box::pin(stream)
    }
}

/// Truncate a string for logging purposes.
fn truncate_for_log(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... [truncated]", &s[..end])
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use futures::stream::BoxStream;

    use crate::llm::{LlmError, Role};

    use super::*;

    /// Model that replays scripted responses, one per call.
    pub struct ScriptedModel {
        responses: Mutex<VecDeque<Vec<Result<ModelChunk, String>>>>,
        pub seen: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedModel {
        pub fn new(responses: Vec<Vec<Result<ModelChunk, String>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn roles_seen(&self, call: usize) -> Vec<Role> {
            self.seen.lock().unwrap()[call]
                .iter()
                .map(|m| m.role)
                .collect()
        }
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn stream_chat(
            &self,
            request: ChatRequest<'_>,
        ) -> Result<BoxStream<'static, Result<ModelChunk, LlmError>>, LlmError> {
            self.seen.lock().unwrap().push(request.messages.to_vec());
            let response = self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .ok_or_else(|| LlmError::Stream("script exhausted".to_string()))?;
            let items: Vec<Result<ModelChunk, LlmError>> = response
                .into_iter()
                .map(|r| r.map_err(LlmError::Stream))
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }
    }
}
