use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Placeholder secret shipped in the default config. Usable for local
/// development only; `validate()` rejects it outside of development.
pub const DEV_TOKEN_SECRET: &str = "dev-only-insecure-token-secret";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub internal: InternalApiConfig,

    #[serde(default)]
    pub services: ServicesConfig,

    #[serde(default)]
    pub scheduler: SchedulerConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// "development" or "production". Controls how strictly secrets are
    /// validated at startup.
    pub environment: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/tanggapin.db".to_string(),
            log_level: "info".to_string(),
            environment: "development".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,

    /// Whether to set the Secure flag on the token cookie.
    /// Default: true for production safety. Set to false for local
    /// development without HTTPS.
    pub secure_cookies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 7600,
            cors_allowed_origins: vec![
                "http://localhost:7600".to_string(),
                "http://127.0.0.1:7600".to_string(),
            ],
            secure_cookies: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// HMAC secret for signing admin tokens.
    /// Overridable via TANGGAPIN_TOKEN_SECRET.
    pub token_secret: String,

    /// Token and session lifetime in hours.
    pub token_ttl_hours: i64,

    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,

    /// Login endpoint throttling policy.
    pub rate_limit: RateLimitConfig,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            token_secret: DEV_TOKEN_SECRET.to_string(),
            token_ttl_hours: 24,
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Max login attempts per client IP in the window.
    pub max_attempts: u32,

    /// Rolling window for counting attempts.
    pub window_seconds: u64,

    /// How often the background sweep evicts stale entries.
    pub sweep_interval_minutes: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            window_seconds: 15 * 60,
            sweep_interval_minutes: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct InternalApiConfig {
    /// Flat shared secret for /api/internal callers.
    /// Overridable via TANGGAPIN_INTERNAL_API_KEY. When empty, every
    /// internal request is rejected.
    pub api_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub ai_base_url: String,

    pub channel_base_url: String,

    pub case_base_url: String,

    pub notification_base_url: String,

    /// Timeout for provisioning calls (channel account creation).
    pub provision_timeout_seconds: u64,

    /// Timeout for best-effort status/enrichment calls.
    pub status_timeout_seconds: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            ai_base_url: "http://localhost:9001".to_string(),
            channel_base_url: "http://localhost:9002".to_string(),
            case_base_url: "http://localhost:9003".to_string(),
            notification_base_url: "http://localhost:9004".to_string(),
            provision_timeout_seconds: 30,
            status_timeout_seconds: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Expired-session purge cadence in minutes.
    pub session_purge_minutes: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            session_purge_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "tanggapin".to_string());

        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            internal: InternalApiConfig::default(),
            services: ServicesConfig::default(),
            scheduler: SchedulerConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Secrets come from the environment in deployed setups; the config
    /// file values are fallbacks for local development.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("TANGGAPIN_TOKEN_SECRET")
            && !secret.is_empty()
        {
            self.security.token_secret = secret;
        }

        if let Ok(key) = std::env::var("TANGGAPIN_INTERNAL_API_KEY")
            && !key.is_empty()
        {
            self.internal.api_key = key;
        }

        if let Ok(path) = std::env::var("TANGGAPIN_DATABASE_PATH")
            && !path.is_empty()
        {
            self.general.database_path = path;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("tanggapin").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".tanggapin").join("config.toml"));
        }

        paths
    }

    #[must_use]
    pub fn is_production(&self) -> bool {
        self.general.environment == "production"
    }

    /// Fail closed on misconfiguration: a production deployment with a
    /// missing or placeholder signing secret must not come up at all.
    pub fn validate(&self) -> Result<()> {
        if self.security.token_secret.is_empty() {
            anyhow::bail!("Token signing secret is not configured");
        }

        if self.is_production() {
            if self.security.token_secret == DEV_TOKEN_SECRET {
                anyhow::bail!("Token signing secret must be changed for production");
            }
            if self.internal.api_key.is_empty() {
                anyhow::bail!("Internal API key must be configured for production");
            }
        }

        if self.security.token_ttl_hours <= 0 {
            anyhow::bail!("Token TTL must be positive");
        }

        if self.security.rate_limit.max_attempts == 0
            || self.security.rate_limit.window_seconds == 0
        {
            anyhow::bail!("Rate limit window and attempt count must be > 0");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.security.rate_limit.max_attempts, 10);
        assert_eq!(config.security.rate_limit.window_seconds, 900);
        assert_eq!(config.security.token_ttl_hours, 24);
        assert_eq!(config.server.port, 7600);
        assert!(config.server.secure_cookies);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[security]"));
        assert!(toml_str.contains("[services]"));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [security]
            token_ttl_hours = 12
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.security.token_ttl_hours, 12);

        assert_eq!(config.security.rate_limit.max_attempts, 10);
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = Config::default();
        config.security.token_secret = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dev_secret_in_production() {
        let mut config = Config::default();
        config.general.environment = "production".to_string();
        config.internal.api_key = "svc-secret".to_string();
        assert!(config.validate().is_err());

        config.security.token_secret = "real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_missing_internal_key_in_production() {
        let mut config = Config::default();
        config.general.environment = "production".to_string();
        config.security.token_secret = "real-secret".to_string();
        assert!(config.validate().is_err());
    }
}
