// src/utils/env.rs
use log::{debug, info};
use std::env;
use std::path::PathBuf;

use crate::utils::constants::DEFAULT_RESULT_CACHE_SIZE;

/// Loads `.env` from the working directory if one exists. Missing files are fine.
pub fn load_env() {
    match dotenv::dotenv() {
        Ok(path) => info!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

/// Process-level settings shared by every domain run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root directory of the JSON document store.
    pub data_dir: PathBuf,
    /// Capacity of the in-process LRU in front of the durable cache.
    pub result_cache_size: usize,
    /// Overrides the per-domain `max_items` when set.
    pub max_items: Option<usize>,
    /// Appended to resolved search links as the affiliate tag.
    pub affiliate_id: String,
    /// Path of a JSON file overriding the built-in domain presets.
    pub domain_config_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            result_cache_size: DEFAULT_RESULT_CACHE_SIZE,
            max_items: None,
            affiliate_id: "krank-20".to_string(),
            domain_config_path: None,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let config = Self {
            data_dir: env::var("RANKING_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            result_cache_size: env::var("RESULT_CACHE_SIZE")
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .filter(|size| *size > 0)
                .unwrap_or(defaults.result_cache_size),
            max_items: env::var("RANKING_MAX_ITEMS")
                .ok()
                .and_then(|s| s.parse::<usize>().ok()),
            affiliate_id: env::var("AFFILIATE_ID").unwrap_or(defaults.affiliate_id),
            domain_config_path: env::var("RANKING_CONFIG_PATH").ok().map(PathBuf::from),
        };
        debug!("Pipeline config: {:?}", config);
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env_overrides() {
        env::set_var("RANKING_DATA_DIR", "/tmp/rankings");
        env::set_var("RESULT_CACHE_SIZE", "0");
        env::set_var("RANKING_MAX_ITEMS", "20");

        let config = PipelineConfig::from_env();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/rankings"));
        // zero capacity falls back to the default
        assert_eq!(config.result_cache_size, DEFAULT_RESULT_CACHE_SIZE);
        assert_eq!(config.max_items, Some(20));

        env::remove_var("RANKING_DATA_DIR");
        env::remove_var("RESULT_CACHE_SIZE");
        env::remove_var("RANKING_MAX_ITEMS");
    }
}
