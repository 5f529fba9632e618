//! Google Gemini client using `streamGenerateContent` over SSE.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest_eventsource::{Event, RequestBuilderExt};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use super::{ChatMessage, ChatModel, ChatRequest, LlmError, ModelChunk, Role, ToolCall};
use crate::tools::ToolSchema;

/// Streaming Gemini client. Cheap to build; one per agent.
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    /// Create a client.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` / `LlmError::MissingModel` if either is blank.
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        api_key: &str,
        model: &str,
        temperature: f32,
    ) -> Result<Self, LlmError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(LlmError::MissingApiKey);
        }

        // Accept both "gemini-2.0-flash" and "models/gemini-2.0-flash".
        let model = model.trim();
        let model = model.strip_prefix("models/").unwrap_or(model);
        if model.is_empty() {
            return Err(LlmError::MissingModel);
        }

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature,
        })
    }

    fn stream_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        )
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn stream_chat(
        &self,
        request: ChatRequest<'_>,
    ) -> Result<BoxStream<'static, Result<ModelChunk, LlmError>>, LlmError> {
        let body = build_request(&request, self.temperature);

        tracing::debug!(
            model = %self.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "Calling Gemini"
        );

        let mut source = self
            .http
            .post(self.stream_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .eventsource()
            .map_err(|e| LlmError::Stream(e.to_string()))?;
        source.set_retry_policy(Box::new(reqwest_eventsource::retry::Never));

        let stream = async_stream::stream! {
            while let Some(event) = source.next().await {
                match event {
                    Ok(Event::Open) => {}
                    Ok(Event::Message(message)) => match decode_chunk(&message.data) {
                        Ok(chunks) => {
                            for chunk in chunks {
                                yield Ok(chunk);
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            break;
                        }
                    },
                    Err(reqwest_eventsource::Error::StreamEnded) => break,
                    Err(reqwest_eventsource::Error::InvalidStatusCode(status, response)) => {
                        let body = response.text().await.unwrap_or_default();
                        yield Err(LlmError::Status {
                            status: status.as_u16(),
                            body: error_message(&body),
                        });
                        break;
                    }
                    Err(reqwest_eventsource::Error::Transport(e)) => {
                        yield Err(LlmError::Http(e));
                        break;
                    }
                    Err(e) => {
                        yield Err(LlmError::Stream(e.to_string()));
                        break;
                    }
                }
            }
            source.close();
        };

        Ok(Box::pin(stream))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ToolDeclarations>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    thought_signature: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default = "empty_args")]
    args: Value,
}

fn empty_args() -> Value {
    json!({})
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Error object Gemini sends in place of a candidate mid-stream.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: Option<String>,
    status: Option<String>,
}

impl From<ApiError> for LlmError {
    fn from(error: ApiError) -> Self {
        let message = error
            .message
            .or(error.status)
            .unwrap_or_else(|| "unknown error".to_string());
        match error.code {
            Some(status) => LlmError::Status {
                status,
                body: message,
            },
            None => LlmError::Stream(message),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Encoding / decoding
// ─────────────────────────────────────────────────────────────────────────────

fn build_request(request: &ChatRequest<'_>, temperature: f32) -> GenerateContentRequest {
    let system_instruction = request
        .system_prompt
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| Content {
            role: None,
            parts: vec![text_part(p)],
        });

    let tools = if request.tools.is_empty() {
        Vec::new()
    } else {
        vec![ToolDeclarations {
            function_declarations: request.tools.iter().map(declaration).collect(),
        }]
    };

    GenerateContentRequest {
        system_instruction,
        contents: encode_messages(request.messages),
        tools,
        generation_config: GenerationConfig { temperature },
    }
}

fn declaration(schema: &ToolSchema) -> FunctionDeclaration {
    FunctionDeclaration {
        name: schema.name.clone(),
        description: schema.description.clone(),
        parameters: schema.parameters.clone(),
    }
}

fn text_part(text: &str) -> Part {
    Part {
        text: Some(text.to_string()),
        ..Part::default()
    }
}

/// Convert the conversation into Gemini contents.
///
/// Consecutive tool results are merged into one `user` turn, since Gemini
/// expects every function call of a turn to be answered together.
fn encode_messages(messages: &[ChatMessage]) -> Vec<Content> {
    let mut contents: Vec<Content> = Vec::new();

    for message in messages {
        match message.role {
            Role::User => {
                if let Some(text) = message.content.as_deref().filter(|t| !t.is_empty()) {
                    contents.push(Content {
                        role: Some("user".to_string()),
                        parts: vec![text_part(text)],
                    });
                }
            }
            Role::Assistant => {
                let mut parts = Vec::new();
                if let Some(text) = message.content.as_deref().filter(|t| !t.is_empty()) {
                    parts.push(text_part(text));
                }
                for call in message.tool_calls.iter().flatten() {
                    parts.push(Part {
                        function_call: Some(FunctionCall {
                            name: call.name.clone(),
                            args: if call.arguments.is_null() {
                                empty_args()
                            } else {
                                call.arguments.clone()
                            },
                        }),
                        thought_signature: call.signature.clone(),
                        ..Part::default()
                    });
                }
                if !parts.is_empty() {
                    contents.push(Content {
                        role: Some("model".to_string()),
                        parts,
                    });
                }
            }
            Role::Tool => {
                let part = Part {
                    function_response: Some(FunctionResponse {
                        name: message.tool_name.clone().unwrap_or_default(),
                        response: json!({ "content": message.content.clone().unwrap_or_default() }),
                    }),
                    ..Part::default()
                };

                let merge = contents.last().is_some_and(|c| {
                    c.role.as_deref() == Some("user")
                        && c.parts.iter().all(|p| p.function_response.is_some())
                });
                match contents.last_mut() {
                    Some(last) if merge => last.parts.push(part),
                    _ => contents.push(Content {
                        role: Some("user".to_string()),
                        parts: vec![part],
                    }),
                }
            }
        }
    }

    contents
}

/// Decode one SSE `data:` payload into model chunks.
fn decode_chunk(data: &str) -> Result<Vec<ModelChunk>, LlmError> {
    let response: GenerateContentResponse = serde_json::from_str(data)?;

    if let Some(error) = response.error {
        return Err(error.into());
    }

    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::Stream(format!("prompt blocked: {}", reason)));
    }

    let mut chunks = Vec::new();
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts)
        .unwrap_or_default();

    for part in parts {
        if part.thought == Some(true) {
            continue;
        }
        if let Some(call) = part.function_call {
            chunks.push(ModelChunk::FunctionCall(ToolCall {
                id: format!("call_{}", Uuid::new_v4().simple()),
                name: call.name,
                arguments: if call.args.is_null() {
                    empty_args()
                } else {
                    call.args
                },
                signature: part.thought_signature,
            }));
        } else if let Some(text) = part.text.filter(|t| !t.is_empty()) {
            chunks.push(ModelChunk::Text(text));
        }
    }

    Ok(chunks)
}

/// Pull the human-readable message out of a Gemini error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
