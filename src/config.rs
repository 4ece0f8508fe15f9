use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub generation: GenerationConfig,

    pub images: ImagesConfig,

    pub cache: CacheConfig,

    pub scheduler: SchedulerConfig,

    pub server: ServerConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

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
            database_path: "sqlite:data/ladle.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Base URL of the external recipe generation service.
    pub service_url: String,

    /// API key sent as X-API-Key. Overridable via LADLE_GENERATION_API_KEY.
    pub api_key: String,

    /// Request timeout in seconds (default: 30). A timeout is treated as a
    /// normal generation failure, not a distinct cancellation path.
    pub request_timeout_seconds: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            api_key: String::new(),
            request_timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub unsplash_base_url: String,

    /// Unsplash access key; empty means the search is unconfigured and the
    /// pipeline serves the default rotation. Overridable via
    /// LADLE_UNSPLASH_ACCESS_KEY.
    pub unsplash_access_key: String,

    /// Fallback images served when the search yields nothing.
    pub default_images: Vec<String>,

    /// Cached image entries older than this are swept (default: 30 days).
    pub cache_max_age_days: i64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            unsplash_base_url: "https://api.unsplash.com".to_string(),
            unsplash_access_key: String::new(),
            default_images: constants::enrichment::DEFAULT_IMAGES
                .iter()
                .map(ToString::to_string)
                .collect(),
            cache_max_age_days: constants::cache::IMAGE_MAX_AGE_DAYS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Minimum ingredient-overlap ratio for reusing a cached recipe.
    pub similarity_threshold: f64,

    /// Most similar matches returned per lookup.
    pub max_matches: usize,

    /// Hours a generated recipe stays reusable before the sweep removes it.
    pub recipe_ttl_hours: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: constants::cache::SIMILARITY_THRESHOLD,
            max_matches: constants::cache::MAX_SIMILAR_MATCHES,
            recipe_ttl_hours: constants::cache::RECIPE_TTL_HOURS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Hours between expired-recipe sweeps (default: 4).
    pub recipe_purge_interval_hours: u32,

    /// Hours between image-cache sweeps (default: 24).
    pub image_purge_interval_hours: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            recipe_purge_interval_hours: 4,
            image_purge_interval_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub enabled: bool,

    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 6780,
            cors_allowed_origins: vec![
                "http://localhost:6780".to_string(),
                "http://127.0.0.1:6780".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub loki_enabled: bool,

    pub loki_url: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                let mut config = Self::load_from_path(path)?;
                config.apply_env_overrides();
                return Ok(config);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
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

    /// Secrets come from the environment when present, so keys never have
    /// to live in the config file.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("LADLE_GENERATION_API_KEY") {
            self.generation.api_key = key;
        }
        if let Ok(key) = std::env::var("LADLE_UNSPLASH_ACCESS_KEY") {
            self.images.unsplash_access_key = key;
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
        let mut paths = vec![PathBuf::from("config.toml")];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ladle").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ladle").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.generation.service_url.is_empty() {
            anyhow::bail!("Generation service URL cannot be empty");
        }

        if !(0.0..=1.0).contains(&self.cache.similarity_threshold) {
            anyhow::bail!("cache.similarity_threshold must be between 0.0 and 1.0");
        }

        if self.cache.recipe_ttl_hours <= 0 {
            anyhow::bail!("cache.recipe_ttl_hours must be > 0");
        }

        if self.scheduler.enabled
            && (self.scheduler.recipe_purge_interval_hours == 0
                || self.scheduler.image_purge_interval_hours == 0)
        {
            anyhow::bail!("Scheduler purge intervals must be > 0 when enabled");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut config = Config::default();
        config.cache.similarity_threshold = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn roundtrips_through_toml() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        let back: Config = toml::from_str(&toml).unwrap();
        assert_eq!(
            back.cache.similarity_threshold,
            config.cache.similarity_threshold
        );
        assert_eq!(back.server.port, config.server.port);
    }
}
