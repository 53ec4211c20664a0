//! Shared helpers for the command line tools

use crate::config::{load_config, load_config_from, Config};
use crate::error::SpentError;
use crate::registry::SqliteRegistry;
use crate::service::SpentAddressService;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::Level;

/// Install the global tracing subscriber. Safe to call more than once.
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Load the config from an explicit path or the default locations
pub fn load_config_or_default(path: Option<&Path>) -> Result<Config, SpentError> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

/// Open the SQLite registry named in the config, creating its directory first
pub fn open_registry(config: &Config) -> Result<SqliteRegistry, SpentError> {
    let db_path = Path::new(&config.database.path);
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| {
                SpentError::IoError(format!(
                    "Failed to create data dir {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    SqliteRegistry::open(&config.database.path)
}

/// Load config, open the registry and wire up the service
pub fn load_service_from_config(
    path: Option<&Path>,
) -> Result<(Config, SpentAddressService), SpentError> {
    let config = load_config_or_default(path)?;
    let registry = open_registry(&config)?;
    let service = SpentAddressService::from_config(Arc::new(registry), &config);
    Ok((config, service))
}

/// Shorten a checksum or address for terminal display
pub fn abbreviate(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 24 {
        let head: String = chars[..12].iter().collect();
        let tail: String = chars[chars.len() - 8..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::SpentAddressRegistry;
    use tempfile::TempDir;

    #[test]
    fn test_abbreviate() {
        assert_eq!(abbreviate("short"), "short");
        let checksum = "0123456789abcdef".repeat(4);
        assert_eq!(abbreviate(&checksum), "0123456789ab...89abcdef");
    }

    #[test]
    fn test_abbreviate_multibyte_checksum_line() {
        let recorded = format!("{}é{}", "a".repeat(11), "b".repeat(51));
        assert_eq!(abbreviate(&recorded), "aaaaaaaaaaaé...bbbbbbbb");

        let tail_heavy = format!("{}ééé", "c".repeat(30));
        assert_eq!(abbreviate(&tail_heavy), "cccccccccccc...cccccééé");
    }

    #[test]
    fn test_open_registry_creates_data_dir() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("data").join("spent.db");

        let mut config = Config::default();
        config.database.path = db_path.to_string_lossy().into_owned();

        let registry = open_registry(&config).unwrap();
        assert!(registry.is_empty().unwrap());
        assert!(db_path.exists());
    }

    #[test]
    fn test_load_service_from_explicit_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let db_path = temp_dir.path().join("spent.db");
        let spent_path = temp_dir.path().join("export.txt");
        fs::write(
            &config_path,
            format!(
                "[database]\npath = {:?}\n\n[spent]\nfile = {:?}\n",
                db_path.to_string_lossy(),
                spent_path.to_string_lossy()
            ),
        )
        .unwrap();

        let (config, service) = load_service_from_config(Some(&config_path)).unwrap();
        assert_eq!(service.spent_file(), spent_path.as_path());
        assert_eq!(config.database.path, db_path.to_string_lossy());
        assert_eq!(service.address_count().unwrap(), 0);
    }
}
