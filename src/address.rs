//! Spent address identifiers
//!
//! An [`AddressHash`] is an 81 character tryte string (`9` and `A`-`Z`).
//! Equality is exact string equality and the raw bytes fed into export
//! checksums are the ASCII bytes of that string.

use crate::error::SpentError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of characters in an address hash
pub const ADDRESS_LENGTH: usize = 81;

/// Characters allowed in an address hash
pub const TRYTE_ALPHABET: &str = "9ABCDEFGHIJKLMNOPQRSTUVWXYZ";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AddressHash(String);

impl AddressHash {
    /// Parse and validate an address hash
    pub fn parse(value: &str) -> Result<Self, SpentError> {
        validate_address(value)?;
        Ok(AddressHash(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes fed into the export checksum
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for AddressHash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for AddressHash {
    type Err = SpentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AddressHash::parse(s)
    }
}

impl TryFrom<String> for AddressHash {
    type Error = SpentError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        validate_address(&value)?;
        Ok(AddressHash(value))
    }
}

impl From<AddressHash> for String {
    fn from(hash: AddressHash) -> Self {
        hash.0
    }
}

impl AsRef<str> for AddressHash {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn validate_address(address: &str) -> Result<(), SpentError> {
    if address.len() != ADDRESS_LENGTH {
        return Err(SpentError::InvalidAddress(format!(
            "expected {} characters, got {}",
            ADDRESS_LENGTH,
            address.len()
        )));
    }

    if let Some(bad) = address.chars().find(|c| !TRYTE_ALPHABET.contains(*c)) {
        return Err(SpentError::InvalidAddress(format!(
            "invalid character '{}'",
            bad
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        format!("{}9", "ABCDEFGHI".repeat(8)) + &"Z".repeat(8)
    }

    #[test]
    fn test_parse_valid_address() {
        let raw = sample();
        assert_eq!(raw.len(), ADDRESS_LENGTH);
        let hash = AddressHash::parse(&raw).unwrap();
        assert_eq!(hash.as_str(), raw);
        assert_eq!(hash.as_bytes(), raw.as_bytes());
        assert_eq!(hash.to_string(), raw);
    }

    #[test]
    fn test_parse_wrong_length() {
        let result = AddressHash::parse("ABC");
        assert!(matches!(result, Err(SpentError::InvalidAddress(_))));

        let too_long = "A".repeat(ADDRESS_LENGTH + 1);
        assert!(AddressHash::parse(&too_long).is_err());
    }

    #[test]
    fn test_parse_rejects_lowercase_and_digits() {
        let lower = "a".repeat(ADDRESS_LENGTH);
        assert!(AddressHash::parse(&lower).is_err());

        let mut digits = "A".repeat(ADDRESS_LENGTH - 1);
        digits.push('1');
        assert!(AddressHash::parse(&digits).is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let hash = AddressHash::parse(&"9".repeat(ADDRESS_LENGTH)).unwrap();
        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", "9".repeat(ADDRESS_LENGTH)));

        let back: AddressHash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, hash);

        assert!(serde_json::from_str::<AddressHash>("\"SHORT\"").is_err());
    }
}
