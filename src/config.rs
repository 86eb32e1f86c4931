use std::path::Path;

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub providers: ProvidersConfig,
    pub rate_limit: RateLimitConfig,
    pub cache: CacheConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    pub stats: StatsConfig,
    pub odds: OddsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatsConfig {
    pub base_url: String,
    pub league: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OddsConfig {
    pub enabled: bool,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_size: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

impl DatabaseConfig {
    pub fn url(&self) -> String {
        format!("sqlite:{}", self.path)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    pub log_level: String,
    pub log_json: bool,
}

/// Secrets loaded exclusively from environment variables.
/// Not serializable, not stored in config files.
pub struct Secrets {
    pub stats_api_key: Option<SecretString>,
    pub odds_api_key: Option<SecretString>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self {
            stats_api_key: std::env::var("STATS_API_KEY").ok().map(SecretString::from),
            odds_api_key: std::env::var("ODDS_API_KEY").ok().map(SecretString::from),
        }
    }
}

impl AppConfig {
    /// Load configuration from config/default.toml, overlaying environment variables for secrets.
    pub fn load() -> Result<(Self, Secrets)> {
        dotenvy::dotenv().ok();

        let config_path = Path::new("config/default.toml");
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: AppConfig =
            toml::from_str(&contents).context("Failed to parse config/default.toml")?;

        let secrets = Secrets::from_env();

        Ok((config, secrets))
    }
}
