//! Configuration module
//!
//! Settings are read from a TOML file (`~/.config/npr-parking/config.toml` by
//! default). Every section and key is optional; missing values fall back to
//! the defaults below.
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 5001
//!
//! [dataset]
//! csv_file = "data/dataset.csv"
//!
//! [bag]
//! api_key = "..."
//!
//! [logging]
//! level = "info"
//! format = "json"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::shared::errors::ConfigError;

/// Environment variable that overrides the configured BAG API key.
pub const BAG_API_KEY_ENV: &str = "BAG_API_KEY";

/// `~/.config/npr-parking/config.toml`, or `./config.toml` without a home.
pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .map(|dir| dir.join("npr-parking").join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub dataset: DatasetConfig,
    pub bag: BagConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Seconds to wait for in-flight requests on shutdown
    pub shutdown_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5001,
            shutdown_timeout: 30,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub csv_file: PathBuf,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            csv_file: PathBuf::from("data/dataset.csv"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BagConfig {
    pub enabled: bool,
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for BagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.bag.kadaster.nl/lvbag/individuelebevragingen/v2".to_string(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}

impl BagConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl AppConfig {
    /// Reads the config at `path`. A missing file yields the defaults.
    ///
    /// `BAG_API_KEY` replaces the file's API key when set.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str::<AppConfig>(&raw)?
        } else {
            AppConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but an unreadable or invalid file yields the
    /// defaults (with environment overrides applied) alongside the error.
    pub fn load_or_default(path: &Path) -> (Self, Option<ConfigError>) {
        match Self::load(path) {
            Ok(config) => (config, None),
            Err(e) => {
                let mut config = AppConfig::default();
                config.apply_env_overrides();
                (config, Some(e))
            }
        }
    }

    /// Applies `BAG_API_KEY` when it is set and not blank.
    pub fn apply_env_overrides(&mut self) {
        self.override_api_key(std::env::var(BAG_API_KEY_ENV).ok());
    }

    fn override_api_key(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.bag.api_key = Some(key);
        }
    }

    /// Writes the config as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must not be 0".into()));
        }
        if self.dataset.csv_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("dataset.csv_file is empty".into()));
        }
        if self.bag.timeout_secs == 0 {
            return Err(ConfigError::Invalid("bag.timeout_secs must be positive".into()));
        }
        Ok(())
    }
}
