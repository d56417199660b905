//! Client for the AI service. Only used for status enrichment; knowledge
//! data flows the other way, through the internal API.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingStatus {
    pub model: String,
    pub ready: bool,
    pub indexed_documents: u64,
}

pub struct AiClient {
    client: reqwest::Client,
    base_url: String,
}

impl AiClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    pub async fn embedding_status(&self) -> Result<EmbeddingStatus> {
        let url = format!("{}/status", self.base_url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("AI service request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("AI service returned {}", response.status());
        }

        let status = response
            .json::<EmbeddingStatus>()
            .await
            .context("Failed to parse AI service status")?;

        Ok(status)
    }
}
