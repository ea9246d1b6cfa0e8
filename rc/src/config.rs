//! Recipes client configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding `api.base-url`
pub const API_URL_ENV: &str = "RECIPES_API_URL";

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// REST API connection
    pub api: ApiConfig,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

/// REST API connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server root; `/api` is appended
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Per-request timeout
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:5001".to_string(),
            timeout_ms: 10_000,
        }
    }
}

impl Config {
    /// Load configuration with fallback chain, then apply the environment
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        if let Ok(url) = std::env::var(API_URL_ENV)
            && !url.trim().is_empty()
        {
            tracing::debug!(%url, "Config::load: base url from environment");
            config.api.base_url = url;
        }
        Ok(config)
    }

    /// Read only the log level, ignoring any load failure
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load_file(config_path).ok().and_then(|c| c.log_level)
    }

    /// Apply a `--api-url` flag, which beats file and environment
    pub fn with_api_url(mut self, api_url: Option<&str>) -> Self {
        if let Some(url) = api_url {
            self.api.base_url = url.to_string();
        }
        self
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .recipes.yml
        let local_config = PathBuf::from(".recipes.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/recipes/recipes.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("recipes").join("recipes.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}
