//! Agent construction.

use std::sync::Arc;

use crate::config::Config;
use crate::http::ReqwestFetcher;
use crate::llm::GeminiClient;
use crate::tools::{ToolContext, ToolRegistry};

use super::{Agent, ReactAgent};

/// Per-request agent settings.
#[derive(Debug, Clone, Copy)]
pub struct AgentSpec<'a> {
    pub api_key: &'a str,
    pub model_name: &'a str,
    pub system_prompt: &'a str,
    pub tools: &'a [String],
}

/// Builds a fresh agent for each chat request.
pub trait AgentFactory: Send + Sync {
    /// # Errors
    ///
    /// Fails if the model client cannot be constructed (e.g. blank API key).
    fn create_agent(&self, spec: AgentSpec<'_>) -> anyhow::Result<Box<dyn Agent>>;
}

/// Factory producing [`ReactAgent`]s over Gemini.
pub struct GeminiAgentFactory {
    http: reqwest::Client,
    config: Config,
}

impl GeminiAgentFactory {
    pub fn new(http: reqwest::Client, config: Config) -> Self {
        Self { http, config }
    }
}

impl AgentFactory for GeminiAgentFactory {
    fn create_agent(&self, spec: AgentSpec<'_>) -> anyhow::Result<Box<dyn Agent>> {
        let model = GeminiClient::new(
            self.http.clone(),
            &self.config.upstream.gemini_url,
            spec.api_key,
            spec.model_name,
            self.config.temperature,
        )?;

        let ctx = ToolContext {
            fetcher: Arc::new(ReqwestFetcher::new(self.http.clone())),
            geocoding_url: self.config.upstream.geocoding_url.clone(),
            forecast_url: self.config.upstream.forecast_url.clone(),
        };
        let tools = ToolRegistry::from_names(spec.tools, &ctx);

        tracing::debug!(
            model = %spec.model_name,
            tools = ?tools.names(),
            "Created agent"
        );

        Ok(Box::new(ReactAgent::new(
            Arc::new(model),
            tools,
            spec.system_prompt,
            self.config.max_iterations,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<'a>(api_key: &'a str, tools: &'a [String]) -> AgentSpec<'a> {
        AgentSpec {
            api_key,
            model_name: "gemini-2.0-flash",
            system_prompt: "You are a helpful AI assistant.",
            tools,
        }
    }

    #[test]
    fn blank_api_key_fails_before_streaming() {
        let factory = GeminiAgentFactory::new(reqwest::Client::new(), Config::default());
        let err = factory.create_agent(spec("", &[])).err().unwrap();
        assert_eq!(err.to_string(), "API key is required");
    }

    #[test]
    fn builds_agent_with_weather_tool() {
        let factory = GeminiAgentFactory::new(reqwest::Client::new(), Config::default());
        let tools = vec!["get_weather".to_string()];
        tokio_test::assert_ok!(factory.create_agent(spec("test-key", &tools)));
    }
}
