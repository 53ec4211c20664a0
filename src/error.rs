//! Error types for SpentLedger

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpentError {
    DestinationIsDirectory(PathBuf),
    IoError(String),
    MissingChecksum(PathBuf),
    ChecksumMismatch {
        path: PathBuf,
        recorded: String,
        computed: String,
    },
    CountMismatch {
        path: PathBuf,
        declared: Option<u64>,
        actual: u64,
    },
    AddressAddFailure(String),
    InvalidAddress(String),
    DatabaseError(String),
    ConfigError(String),
}

impl fmt::Display for SpentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SpentError::DestinationIsDirectory(path) => write!(
                f,
                "Failed to create spent address file: {} is a directory",
                path.display()
            ),
            SpentError::IoError(msg) => write!(f, "IO error: {}", msg),
            SpentError::MissingChecksum(path) => {
                write!(f, "{} did not have a checksum", path.display())
            }
            SpentError::ChecksumMismatch {
                path,
                recorded,
                computed,
            } => write!(
                f,
                "Checksum mismatch for file {} (recorded {}, computed {})",
                path.display(),
                recorded,
                computed
            ),
            SpentError::CountMismatch {
                path,
                declared,
                actual,
            } => match declared {
                Some(declared) => write!(
                    f,
                    "Count mismatch for file {}: declared {}, found {}",
                    path.display(),
                    declared,
                    actual
                ),
                None => write!(
                    f,
                    "Count missing for file {}: found {} addresses",
                    path.display(),
                    actual
                ),
            },
            SpentError::AddressAddFailure(msg) => write!(f, "Failed to save address: {}", msg),
            SpentError::InvalidAddress(msg) => write!(f, "Invalid address: {}", msg),
            SpentError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            SpentError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SpentError {}

impl From<std::io::Error> for SpentError {
    fn from(err: std::io::Error) -> Self {
        SpentError::IoError(err.to_string())
    }
}

impl From<rusqlite::Error> for SpentError {
    fn from(err: rusqlite::Error) -> Self {
        SpentError::DatabaseError(err.to_string())
    }
}

impl From<crate::config::ConfigError> for SpentError {
    fn from(err: crate::config::ConfigError) -> Self {
        SpentError::ConfigError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, SpentError>;
