pub mod ai;
pub mod channel;

use std::time::Duration;

use anyhow::Result;

/// Shared reqwest client for downstream service calls.
pub fn build_shared_http_client(timeout: Duration) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .user_agent("Tanggapin/1.0")
        .pool_max_idle_per_host(10)
        .build()?;

    Ok(client)
}
