use crate::error::{Result, ScraperError};
use serde::Deserialize;
use std::fs;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub ingest: IngestConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct IngestConfig {
    /// Pause between disclosures, courtesy to the remote source.
    pub delay_ms: u64,
    pub timeout_seconds: u64,
    /// Trading-API page length.
    pub batch_length: u64,
    /// How far back the senate feed date window reaches.
    pub lookback_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct StoreConfig {
    /// Page size for full-table scans (reconcile, fix-types).
    pub page_size: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = "config.toml";
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ScraperError::Config(format!("Failed to read config file '{config_path}': {e}"))
        })?;

        let config: Config = toml::from_str(&config_content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ingest: IngestConfig {
                delay_ms: 2000,
                timeout_seconds: 30,
                batch_length: 100,
                lookback_days: 180,
            },
            store: StoreConfig { page_size: 1000 },
        }
    }
}
