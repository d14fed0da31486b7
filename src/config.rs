use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use config::{Config, ConfigError};
use chrono::{FixedOffset, Offset, Utc};
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub minio: MinioConfig,
    pub news: NewsConfig,
    #[serde(default)]
    pub business: BusinessConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct StoreConfig {
    /// JSON snapshot written after every commit. In-memory only when unset.
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MinioConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    pub region: String,
    /// Prefix of every public object URL handed out to the catalog.
    pub public_base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct NewsConfig {
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    pub query: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

pub const DEFAULT_RECEIPT_VALIDITY_HOURS: i64 = 48;

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct BusinessConfig {
    /// Identity-provider uid of the owner account.
    pub owner_uid: String,
    pub utc_offset_hours: i32,
    pub receipt_base_url: String,
    pub receipt_validity_hours: i64,
    pub rollover_interval_secs: u64,
    pub featured_limit: usize,
}

fn default_page_size() -> u32 {
    4
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            owner_uid: String::new(),
            utc_offset_hours: 1,
            receipt_base_url: "http://localhost:3000/receipt".to_string(),
            receipt_validity_hours: DEFAULT_RECEIPT_VALIDITY_HOURS,
            rollover_interval_secs: 60,
            featured_limit: 3,
        }
    }
}

impl BusinessConfig {
    /// Fixed offset of the business calendar; falls back to UTC on an out-of-range value.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_hours * 3600)
            .unwrap_or_else(|| Utc.fix())
    }
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name("config/default.yaml"))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__"),
            );

        let config = builder.build()?;
        let settings: Settings = config.try_deserialize()?;

        debug!(
            bind = %settings.server.bind,
            snapshot = ?settings.store.snapshot_path,
            bucket = %settings.minio.bucket,
            news_endpoint = %settings.news.endpoint,
            utc_offset_hours = settings.business.utc_offset_hours,
            "Loaded settings"
        );

        Ok(settings)
    }
}
