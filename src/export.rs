//! Spent address export
//!
//! Reads the registry once, checksums the snapshot, and writes it to a
//! temporary file next to the destination which is then renamed over it.
//! A failed export never leaves a truncated file at the destination.

use crate::error::SpentError;
use crate::format;
use crate::registry::SpentAddressRegistry;
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Outcome of a successful export
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub count: usize,
    pub path: PathBuf,
    pub size_bytes: u64,
    pub size_mb: u64,
    pub checksum: String,
    pub generated_at: i64,
}

/// Export every address in `registry` to `destination`, overwriting any
/// existing regular file there.
pub fn export_spent_addresses(
    registry: &dyn SpentAddressRegistry,
    destination: &Path,
) -> Result<ExportSummary, SpentError> {
    if destination.is_dir() {
        error!(
            "Found a directory called {}, aborting!",
            destination.display()
        );
        return Err(SpentError::DestinationIsDirectory(
            destination.to_path_buf(),
        ));
    }
    if destination.exists() {
        info!("{} already exists.. Overwriting!", destination.display());
    }

    let addresses = registry.all_addresses()?;
    let checksum = format::checksum_of(&addresses);
    let generated_at = chrono::Utc::now().timestamp_millis();

    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(".spent-export")
        .suffix(".tmp")
        .tempfile_in(dir)?;
    debug!("Writing export to temporary file {}", temp.path().display());

    {
        let mut writer = BufWriter::new(temp.as_file());
        format::write_export(&mut writer, generated_at, &checksum, &addresses)?;
        writer.flush()?;
    }
    temp.as_file().sync_all()?;

    // Temp files are created owner-only; take the mode of the file being replaced.
    if let Some(permissions) = export_permissions(destination) {
        temp.as_file().set_permissions(permissions)?;
    }

    temp.persist(destination).map_err(|e| {
        SpentError::IoError(format!(
            "Failed to finalize {}: {}",
            destination.display(),
            e.error
        ))
    })?;

    let size_bytes = fs::metadata(destination)?.len();

    info!(
        "Exported {} spent addresses to {} (checksum {})",
        addresses.len(),
        destination.display(),
        checksum
    );

    Ok(ExportSummary {
        count: addresses.len(),
        path: destination.to_path_buf(),
        size_bytes,
        size_mb: size_bytes / BYTES_PER_MB,
        checksum,
        generated_at,
    })
}

fn export_permissions(destination: &Path) -> Option<fs::Permissions> {
    match fs::metadata(destination) {
        Ok(existing) => Some(existing.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<fs::Permissions> {
    None
}
