use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::clients::ai::AiClient;
use crate::clients::build_shared_http_client;
use crate::clients::channel::ChannelClient;
use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, ProvisioningService, RateLimiter, SeaOrmAuthService, TokenCodec,
};

/// Everything the request handlers and background jobs share.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,
    pub store: Store,
    pub rate_limiter: Arc<RateLimiter>,
    pub auth: Arc<dyn AuthService>,
    pub provisioning: Arc<ProvisioningService>,
    pub ai: Arc<AiClient>,
}

impl SharedState {
    pub async fn new(config: Config) -> Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    /// Split out so tests can hand in an in-memory store.
    pub fn with_store(config: Config, store: Store) -> Result<Self> {
        let codec = Arc::new(TokenCodec::new(
            config.security.token_secret.clone(),
            config.security.token_ttl_hours,
        ));

        let rate_limiter = Arc::new(RateLimiter::new(
            config.security.rate_limit.max_attempts,
            Duration::from_secs(config.security.rate_limit.window_seconds),
        ));

        let provision_client = build_shared_http_client(Duration::from_secs(
            config.services.provision_timeout_seconds,
        ))?;
        let status_client =
            build_shared_http_client(Duration::from_secs(config.services.status_timeout_seconds))?;

        let channel = Arc::new(ChannelClient::new(
            provision_client,
            config.services.channel_base_url.clone(),
        ));
        let ai = Arc::new(AiClient::new(
            status_client,
            config.services.ai_base_url.clone(),
        ));

        let auth: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            codec,
            rate_limiter.clone(),
        ));

        let provisioning = Arc::new(ProvisioningService::new(
            store.clone(),
            channel,
            config.security.clone(),
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            rate_limiter,
            auth,
            provisioning,
            ai,
        })
    }
}
