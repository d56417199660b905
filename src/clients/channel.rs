//! Client for the channel service that manages per-village messaging
//! accounts (WhatsApp and web widget).

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct ProvisionAccountRequest<'a> {
    village_id: i32,
    slug: &'a str,
}

pub struct ChannelClient {
    client: reqwest::Client,
    base_url: String,
}

impl ChannelClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Create the messaging account for a freshly registered village.
    pub async fn provision_account(&self, village_id: i32, slug: &str) -> Result<()> {
        let url = format!("{}/accounts", self.base_url);
        debug!(village_id, slug = %slug, "Provisioning channel account");

        let response = self
            .client
            .post(&url)
            .json(&ProvisionAccountRequest { village_id, slug })
            .send()
            .await
            .context("Channel service request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Channel service returned {status}: {body}");
        }

        info!(village_id, "Channel account provisioned");
        Ok(())
    }
}
