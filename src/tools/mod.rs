//! Tools the agent can call.
//!
//! A tool exposes a name, a description and a JSON schema for its
//! arguments. The model sees the schema and decides when to call it.

mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::http::JsonFetcher;

pub use weather::{weather_condition, GetWeather};

/// A callable capability exposed to the model.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as the model will call it.
    fn name(&self) -> &str;

    /// What the tool does, shown to the model.
    fn description(&self) -> &str;

    /// JSON schema of the arguments object.
    fn parameters_schema(&self) -> Value;

    /// Run the tool.
    async fn execute(&self, args: Value) -> anyhow::Result<String>;
}

/// Schema of a tool as sent to the model.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// Dependencies shared by tool implementations.
#[derive(Clone)]
pub struct ToolContext {
    pub fetcher: Arc<dyn JsonFetcher>,
    pub geocoding_url: String,
    pub forecast_url: String,
}

/// The set of tools enabled for one agent.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry holding the named tools. Unknown names are skipped.
    pub fn from_names(names: &[String], ctx: &ToolContext) -> Self {
        let mut registry = Self::new();

        for name in names {
            match name.as_str() {
                "get_weather" => registry.register(Arc::new(GetWeather::new(ctx.clone()))),
                other => tracing::warn!(tool = %other, "Ignoring unknown tool"),
            }
        }

        registry
    }

    /// Add a tool. Registering the same name twice keeps the first one.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            return;
        }
        self.order.push(name.clone());
        self.tools.insert(name, tool);
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Schemas of every registered tool, in registration order.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| ToolSchema {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Execute a tool by name.
    pub async fn execute(&self, name: &str, args: Value) -> anyhow::Result<String> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown tool: {}", name))?;

        tool.execute(args).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Fetcher that answers from canned responses keyed by URL prefix.
    pub struct CannedFetcher {
        routes: Vec<(String, anyhow::Result<Value>)>,
        pub requested: Mutex<Vec<String>>,
    }

    impl CannedFetcher {
        pub fn new() -> Self {
            Self {
                routes: Vec::new(),
                requested: Mutex::new(Vec::new()),
            }
        }

        pub fn route(mut self, prefix: &str, response: Value) -> Self {
            self.routes.push((prefix.to_string(), Ok(response)));
            self
        }

        pub fn fail(mut self, prefix: &str, message: &str) -> Self {
            self.routes
                .push((prefix.to_string(), Err(anyhow::anyhow!(message.to_string()))));
            self
        }
    }

    #[async_trait]
    impl JsonFetcher for CannedFetcher {
        async fn get_json(&self, url: &str) -> anyhow::Result<Value> {
            self.requested.lock().unwrap().push(url.to_string());
            for (prefix, response) in &self.routes {
                if url.starts_with(prefix.as_str()) {
                    return match response {
                        Ok(v) => Ok(v.clone()),
                        Err(e) => Err(anyhow::anyhow!(e.to_string())),
                    };
                }
            }
            Err(anyhow::anyhow!("no route for {}", url))
        }
    }

    pub fn context(fetcher: Arc<dyn JsonFetcher>) -> ToolContext {
        ToolContext {
            fetcher,
            geocoding_url: "https://geo.test".to_string(),
            forecast_url: "https://forecast.test".to_string(),
        }
    }
}
