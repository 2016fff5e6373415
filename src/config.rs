use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    // Persistence
    pub storage_dir: PathBuf,

    // Routing
    pub base_path: String,

    // Translation
    pub translation_endpoint: Option<String>,
    pub cache_flush_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Persistence - one JSON file per storage key
            storage_dir: std::env::var("AVUNTIA_STORAGE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(".avuntia")),

            // Routing - deployment prefix, empty for root deployments
            base_path: std::env::var("AVUNTIA_BASE_PATH").unwrap_or_default(),

            // Translation - no endpoint means auto-translation stays off
            translation_endpoint: std::env::var("AVUNTIA_TRANSLATION_ENDPOINT").ok(),
            cache_flush_delay: std::env::var("AVUNTIA_CACHE_FLUSH_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or_else(|| Duration::from_millis(400)),
        })
    }
}
