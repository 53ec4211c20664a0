//! Configuration management for SpentLedger

use serde::Deserialize;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default name of the export file, also the default merge input
pub const DEFAULT_SPENT_FILE: &str = "spentAddresses.txt";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub spent: SpentConfig,
    #[serde(default)]
    pub merge: MergeConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SpentConfig {
    #[serde(default = "default_spent_file")]
    pub file: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MergeConfig {
    #[serde(default)]
    pub strict_count: bool,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    #[serde(default = "default_api_host")]
    pub host: String,
    #[serde(default = "default_api_port")]
    pub port: u16,
    /// Browser origins allowed to call the API. Empty means same-origin only.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}

impl Default for SpentConfig {
    fn default() -> Self {
        Self {
            file: default_spent_file(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_api_host(),
            port: default_api_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Config {
    pub fn spent_file(&self) -> PathBuf {
        PathBuf::from(&self.spent.file)
    }

    pub fn api_host(&self) -> Result<IpAddr, ConfigError> {
        self.api.host.parse().map_err(|_| {
            ConfigError::Invalid(format!("api.host {:?} is not an IP address", self.api.host))
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "database.path must be set in config.toml".to_string(),
            ));
        }

        if self.spent.file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "spent.file must be set in config.toml".to_string(),
            ));
        }

        self.api_host()?;

        if let Some(origin) = self
            .api
            .cors_origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(ConfigError::Invalid(format!(
                "api.cors_origins entry {:?} must be an http(s) origin",
                origin
            )));
        }

        Ok(())
    }
}

/// Load `config.toml` from the working directory, then from the per-user
/// location, falling back to defaults when neither exists.
pub fn load_config() -> Result<Config, ConfigError> {
    let local = Path::new("config.toml");
    if local.exists() {
        load_config_from(local)
    } else {
        load_config_from(&get_user_config_path())
    }
}

pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config = if path.exists() {
        let config_str = fs::read_to_string(path)?;
        toml::from_str(&config_str)?
    } else {
        Config::default()
    };

    config.validate()?;
    Ok(config)
}

/// Per-user config location, `~/.spentledger/config.toml`
pub fn get_user_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".spentledger")
        .join("config.toml")
}

fn default_database_path() -> String {
    "./data/spent.db".to_string()
}

fn default_spent_file() -> String {
    DEFAULT_SPENT_FILE.to_string()
}

fn default_api_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    14265
}
