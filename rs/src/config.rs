//! RecipeStore configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable overriding the listen port
pub const PORT_ENV: &str = "PORT";

/// Environment variable overriding the database path
pub const DATABASE_ENV: &str = "RECIPESTORE_DATABASE";

/// Main RecipeStore configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file
    pub database: PathBuf,

    /// Address to bind
    pub host: String,

    pub port: u16,

    #[serde(rename = "log-level")]
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: default_database(),
            host: "0.0.0.0".to_string(),
            port: crate::DEFAULT_PORT,
            log_level: None,
        }
    }
}

fn default_database() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("recipestore")
        .join("recipes.db")
}

impl Config {
    /// Load configuration with fallback chain, then apply environment overrides
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let mut config = Self::load_file(config_path)?;
        config.apply_env();
        Ok(config)
    }

    /// Read only the log level, ignoring any load failure
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load_file(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_file(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Project-local config: .recipestore.yml
        let local_config = PathBuf::from(".recipestore.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // User config: ~/.config/recipestore/recipestore.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("recipestore").join("recipestore.yml");
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

    fn apply_env(&mut self) {
        if let Ok(port) = std::env::var(PORT_ENV) {
            match port.parse() {
                Ok(port) => self.port = port,
                Err(_) => tracing::warn!(%port, "Ignoring unparseable {}", PORT_ENV),
            }
        }
        if let Ok(path) = std::env::var(DATABASE_ENV)
            && !path.is_empty()
        {
            self.database = PathBuf::from(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 5001);
        assert_eq!(config.host, "0.0.0.0");
        assert!(config.database.ends_with("recipestore/recipes.db"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let yaml = r#"
port: 8080
log-level: debug
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    #[serial]
    fn test_explicit_file_and_env_override() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("recipestore.yml");
        fs::write(&path, "port: 7000\ndatabase: /tmp/file.db\n").unwrap();

        unsafe {
            std::env::set_var(PORT_ENV, "7100");
            std::env::remove_var(DATABASE_ENV);
        }
        let config = Config::load(Some(&path)).unwrap();
        unsafe {
            std::env::remove_var(PORT_ENV);
        }

        assert_eq!(config.port, 7100);
        assert_eq!(config.database, PathBuf::from("/tmp/file.db"));
    }

    #[test]
    #[serial]
    fn test_bad_port_env_is_ignored() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("recipestore.yml");
        fs::write(&path, "port: 7000\n").unwrap();

        unsafe {
            std::env::set_var(PORT_ENV, "not-a-port");
        }
        let config = Config::load(Some(&path)).unwrap();
        unsafe {
            std::env::remove_var(PORT_ENV);
        }
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let path = PathBuf::from("/nonexistent/recipestore.yml");
        assert!(Config::load(Some(&path)).is_err());
        assert_eq!(Config::load_log_level(Some(&path)), None);
    }
}
