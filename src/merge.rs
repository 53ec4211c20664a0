//! Merge spent address files into a registry
//!
//! Each file is verified before any of its addresses are imported. Problems
//! with one file are recorded in the [`MergeReport`] and never stop the rest
//! of the batch.

use crate::address::AddressHash;
use crate::error::SpentError;
use crate::format::{self, ExportLine};
use crate::registry::{AddOutcome, SpentAddressRegistry};
use crate::verify;
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Reject files whose declared count disagrees with their address lines
    pub strict_count: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Addresses newly added to the registry
    pub imported_count: u64,
    /// Addresses the registry already held
    pub duplicate_count: u64,
    /// Addresses the registry rejected
    pub failed_count: u64,
    pub errors: Vec<String>,
    pub skipped: Vec<String>,
}

/// Per-file import tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FileImport {
    inserted: u64,
    duplicates: u64,
    failed: u64,
}

impl FileImport {
    fn accepted(&self) -> u64 {
        self.inserted + self.duplicates
    }
}

/// Emits a progress percentage each time the imported share of the declared
/// count crosses a 10% boundary.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    declared: u64,
    next_decile: u64,
}

impl ProgressTracker {
    /// `None` when the declared count is unknown or zero
    pub fn new(declared: Option<u64>) -> Option<Self> {
        match declared {
            Some(declared) if declared > 0 => Some(ProgressTracker {
                declared,
                next_decile: 1,
            }),
            _ => None,
        }
    }

    /// Returns the percentage to report when `done` crosses a new boundary
    pub fn advance(&mut self, done: u64) -> Option<u64> {
        if self.next_decile > 10 {
            return None;
        }

        let reached = done.saturating_mul(10) / self.declared;
        if reached < self.next_decile {
            return None;
        }

        self.next_decile = reached + 1;
        Some((done.saturating_mul(100) / self.declared).min(100))
    }
}

/// Merge every file in `paths` (or `default_path` when `paths` is empty)
/// into `registry`.
pub fn merge_spent_addresses(
    registry: &dyn SpentAddressRegistry,
    paths: &[PathBuf],
    default_path: &Path,
    options: &MergeOptions,
) -> MergeReport {
    let defaults = [default_path.to_path_buf()];
    let paths = if paths.is_empty() { &defaults[..] } else { paths };

    let mut report = MergeReport::default();

    for path in paths {
        if !path.exists() {
            warn!("File {} did not exist on disk.. ignoring!", path.display());
            report
                .skipped
                .push(format!("File {} did not exist on disk", path.display()));
            continue;
        }
        if path.is_dir() {
            warn!("Found a directory called {}, ignoring!", path.display());
            report
                .skipped
                .push(format!("{} is a directory", path.display()));
            continue;
        }

        if let Err(e) = check_file(path, options) {
            error!("{}", e);
            report.errors.push(e.to_string());
            continue;
        }

        let mut tally = FileImport::default();
        let result = import_file(registry, path, &mut tally);

        report.imported_count += tally.inserted;
        report.duplicate_count += tally.duplicates;
        report.failed_count += tally.failed;

        match result {
            Ok(()) => info!(
                "Imported {} new spent addresses from {} ({} already known, {} failed)",
                tally.inserted,
                path.display(),
                tally.duplicates,
                tally.failed
            ),
            Err(e) => {
                error!("Caught error during read: {}", e);
                report.errors.push(e.to_string());
            }
        }
    }

    report
}

fn check_file(path: &Path, options: &MergeOptions) -> Result<(), SpentError> {
    let verification = verify::verify_file(path)?.ensure_valid()?;
    if options.strict_count {
        verification.ensure_count()?;
    } else if !verification.count_matches() {
        warn!(
            "{} declares {:?} addresses but contains {}; importing all address lines",
            path.display(),
            verification.declared_count,
            verification.address_count
        );
    }
    Ok(())
}

fn import_file(
    registry: &dyn SpentAddressRegistry,
    path: &Path,
    tally: &mut FileImport,
) -> Result<(), SpentError> {
    let file = File::open(path).map_err(|e| {
        SpentError::IoError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut progress: Option<ProgressTracker> = None;
    let mut count_seen = false;

    for line in format::read_lines(BufReader::new(file)) {
        let line = line
            .map_err(|e| SpentError::IoError(format!("Failed to read {}: {}", path.display(), e)))?;

        match line {
            ExportLine::Timestamp(raw) => log_generated_at(path, &raw),
            ExportLine::Checksum(_) => {}
            ExportLine::Count(raw) => {
                if count_seen {
                    continue;
                }
                if let Some(count) = format::parse_count(&raw) {
                    count_seen = true;
                    info!("Importing {} spent addresses", count);
                    progress = ProgressTracker::new(Some(count));
                }
            }
            ExportLine::Address(raw) => {
                match save_line(registry, &raw) {
                    Ok(AddOutcome::Inserted) => tally.inserted += 1,
                    Ok(AddOutcome::Duplicate) => tally.duplicates += 1,
                    Err(e) => {
                        error!("Caught error during saveAddress: {}", e);
                        tally.failed += 1;
                        continue;
                    }
                }

                if let Some(percent) = progress.as_mut().and_then(|p| p.advance(tally.accepted())) {
                    info!("Importing spent addresses {}%..", percent);
                }
            }
        }
    }

    Ok(())
}

fn save_line(registry: &dyn SpentAddressRegistry, raw: &str) -> Result<AddOutcome, SpentError> {
    let hash = AddressHash::parse(raw)
        .map_err(|e| SpentError::AddressAddFailure(format!("{}: {}", raw, e)))?;
    registry.save_address(&hash)
}

fn log_generated_at(path: &Path, raw: &str) {
    let generated = format::parse_timestamp(raw)
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| raw.to_string());
    info!(
        "Importing spent addresses from {} generated at {}",
        path.display(),
        generated
    );
}
