//! Checksum verification of spent address files
//!
//! Verification is a read-only pass: it recomputes the digest from every
//! address shaped line and compares it to the first checksum shaped line.

use crate::error::SpentError;
use crate::format::{self, ChecksumAccumulator, ExportLine};
use serde::Serialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Verification {
    pub path: PathBuf,
    pub is_valid: bool,
    pub recorded_checksum: String,
    pub computed_checksum: String,
    /// Number of address lines found
    pub address_count: u64,
    /// Count declared in the file, if a count line parsed
    pub declared_count: Option<u64>,
}

impl Verification {
    pub fn count_matches(&self) -> bool {
        self.declared_count == Some(self.address_count)
    }

    /// Turn a mismatch into [`SpentError::ChecksumMismatch`]
    pub fn ensure_valid(self) -> Result<Self, SpentError> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(SpentError::ChecksumMismatch {
                path: self.path,
                recorded: self.recorded_checksum,
                computed: self.computed_checksum,
            })
        }
    }

    /// Turn a declared/actual count disagreement into [`SpentError::CountMismatch`]
    pub fn ensure_count(self) -> Result<Self, SpentError> {
        if self.count_matches() {
            Ok(self)
        } else {
            Err(SpentError::CountMismatch {
                path: self.path,
                declared: self.declared_count,
                actual: self.address_count,
            })
        }
    }
}

/// Recompute and compare the checksum of the file at `path`
pub fn verify_file(path: &Path) -> Result<Verification, SpentError> {
    let file = File::open(path).map_err(|e| {
        SpentError::IoError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let mut acc = ChecksumAccumulator::new();
    let mut recorded: Option<String> = None;
    let mut declared_count: Option<u64> = None;

    for line in format::read_lines(BufReader::new(file)) {
        let line = line.map_err(|e| {
            error!("Caught error during read of {}: {}", path.display(), e);
            SpentError::IoError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        match line {
            ExportLine::Timestamp(_) => {}
            ExportLine::Checksum(checksum) => {
                if recorded.is_none() {
                    recorded = Some(checksum);
                } else {
                    debug!("Ignoring extra checksum line in {}", path.display());
                }
            }
            ExportLine::Count(raw) => {
                if declared_count.is_none() {
                    declared_count = format::parse_count(&raw);
                }
            }
            ExportLine::Address(address) => acc.update(address.as_bytes()),
        }
    }

    let address_count = acc.count();
    let computed_checksum = acc.finalize();

    let recorded_checksum = match recorded {
        Some(checksum) => checksum,
        None => {
            error!("{} did not have a checksum", path.display());
            return Err(SpentError::MissingChecksum(path.to_path_buf()));
        }
    };

    let is_valid = recorded_checksum == computed_checksum;
    if !is_valid {
        warn!(
            "Checksum mismatch for file {}: recorded {}, computed {}",
            path.display(),
            recorded_checksum,
            computed_checksum
        );
    }

    Ok(Verification {
        path: path.to_path_buf(),
        is_valid,
        recorded_checksum,
        computed_checksum,
        address_count,
        declared_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::{AddressHash, ADDRESS_LENGTH};
    use crate::format::{checksum_of, write_export};
    use std::fs;
    use tempfile::TempDir;

    fn address(c: char) -> AddressHash {
        AddressHash::parse(&c.to_string().repeat(ADDRESS_LENGTH)).unwrap()
    }

    fn write_valid(path: &Path, addresses: &[AddressHash]) {
        let mut out = Vec::new();
        write_export(&mut out, 1_700_000_000_000, &checksum_of(addresses), addresses).unwrap();
        fs::write(path, out).unwrap();
    }

    #[test]
    fn test_verify_valid_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spent.txt");
        let addresses = vec![address('A'), address('B'), address('C')];
        write_valid(&path, &addresses);

        let verification = verify_file(&path).unwrap();
        assert!(verification.is_valid);
        assert_eq!(verification.recorded_checksum, verification.computed_checksum);
        assert_eq!(verification.address_count, 3);
        assert_eq!(verification.declared_count, Some(3));
        assert!(verification.count_matches());
        assert!(verification.ensure_valid().is_ok());
    }

    #[test]
    fn test_verify_flipped_address_character() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spent.txt");
        write_valid(&path, &[address('A'), address('B')]);

        let contents = fs::read_to_string(&path).unwrap();
        let tampered = contents.replacen(&"B".repeat(ADDRESS_LENGTH), &format!("C{}", "B".repeat(80)), 1);
        assert_ne!(contents, tampered);
        fs::write(&path, tampered).unwrap();

        let verification = verify_file(&path).unwrap();
        assert!(!verification.is_valid);
        assert!(matches!(
            verification.ensure_valid(),
            Err(SpentError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_verify_flipped_checksum_character() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spent.txt");
        let addresses = vec![address('D')];
        write_valid(&path, &addresses);

        let checksum = checksum_of(&addresses);
        let first = checksum.chars().next().unwrap();
        let replacement = if first == '0' { '1' } else { '0' };
        let bad_checksum = format!("{}{}", replacement, &checksum[1..]);

        let contents = fs::read_to_string(&path).unwrap();
        fs::write(&path, contents.replace(&checksum, &bad_checksum)).unwrap();

        let verification = verify_file(&path).unwrap();
        assert!(!verification.is_valid);
        assert_eq!(verification.recorded_checksum, bad_checksum);
        assert_eq!(verification.computed_checksum, checksum);
    }

    #[test]
    fn test_verify_missing_checksum() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spent.txt");
        fs::write(&path, format!("1700000000000\n1\n{}\n", "A".repeat(81))).unwrap();

        assert_eq!(
            verify_file(&path),
            Err(SpentError::MissingChecksum(path.clone()))
        );
    }

    #[test]
    fn test_verify_first_checksum_wins() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spent.txt");
        let addresses = vec![address('E')];
        let good = checksum_of(&addresses);
        let other = "f".repeat(64);
        fs::write(
            &path,
            format!("1700000000000\n{}\n1\n{}\n{}\n", good, addresses[0], other),
        )
        .unwrap();

        let verification = verify_file(&path).unwrap();
        assert!(verification.is_valid);
        assert_eq!(verification.recorded_checksum, good);
    }

    #[test]
    fn test_verify_tolerates_missing_timestamp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spent.txt");
        let addresses = vec![address('F'), address('G')];
        fs::write(
            &path,
            format!(
                "{}\n2\n{}\n{}\n",
                checksum_of(&addresses),
                addresses[0],
                addresses[1]
            ),
        )
        .unwrap();

        let verification = verify_file(&path).unwrap();
        assert!(verification.is_valid);
        assert_eq!(verification.declared_count, Some(2));
    }

    #[test]
    fn test_verify_count_mismatch_is_still_valid() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("spent.txt");
        let addresses = vec![address('H')];
        fs::write(
            &path,
            format!("1700000000000\n{}\n7\n{}\n", checksum_of(&addresses), addresses[0]),
        )
        .unwrap();

        let verification = verify_file(&path).unwrap();
        assert!(verification.is_valid);
        assert!(!verification.count_matches());
        assert!(matches!(
            verification.ensure_count(),
            Err(SpentError::CountMismatch {
                declared: Some(7),
                actual: 1,
                ..
            })
        ));
    }

    #[test]
    fn test_verify_missing_file_is_io_failure() {
        let temp_dir = TempDir::new().unwrap();
        let result = verify_file(&temp_dir.path().join("nope.txt"));
        assert!(matches!(result, Err(SpentError::IoError(_))));
    }
}
