//! Outbound JSON fetching.
//!
//! Tools talk to public APIs through [`JsonFetcher`] so that the lookup
//! logic can be exercised without a network.

use async_trait::async_trait;
use serde_json::Value;

/// "GET url -> JSON or failure".
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn get_json(&self, url: &str) -> anyhow::Result<Value>;
}

/// [`JsonFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JsonFetcher for ReqwestFetcher {
    async fn get_json(&self, url: &str) -> anyhow::Result<Value> {
        tracing::debug!(url = %url, "GET");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("HTTP error: {} {}", status, body.trim()));
        }

        Ok(response.json().await?)
    }
}
