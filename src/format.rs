//! Spent address file format
//!
//! ```text
//! line 1: <milliseconds since epoch>
//! line 2: <64 lowercase hex chars>   SHA-256 of the concatenated address bytes
//! line 3: <decimal count>
//! line 4..: <81 character address>
//! ```
//!
//! Readers classify lines by character length rather than position. A
//! checksum is 64 characters and an address 81, so the two can never collide;
//! every other line (timestamp, count, blank) falls into [`LineKind::Other`].
//! The timestamp line is optional, so a leading line only counts as one when
//! it could be a millisecond timestamp.

use crate::address::{AddressHash, ADDRESS_LENGTH};
use sha2::{Digest, Sha256};
use std::io::{self, BufRead, Write};

/// Length of a hex encoded SHA-256 digest
pub const CHECKSUM_LENGTH: usize = 64;

/// Smallest leading value read as a timestamp (1973-03-03 in milliseconds).
/// Anything below is a count line in a file without a timestamp.
pub const MIN_TIMESTAMP_MILLIS: i64 = 100_000_000_000;

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Checksum,
    Address,
    Other,
}

/// Classify a line (without its terminator) by shape
pub fn classify_line(line: &str) -> LineKind {
    match line.chars().count() {
        CHECKSUM_LENGTH => LineKind::Checksum,
        ADDRESS_LENGTH => LineKind::Address,
        _ => LineKind::Other,
    }
}

/// Parse a count line. Returns `None` for blank or non-numeric lines.
pub fn parse_count(line: &str) -> Option<u64> {
    line.trim().parse().ok()
}

/// Parse a timestamp line (milliseconds since epoch)
pub fn parse_timestamp(line: &str) -> Option<i64> {
    line.trim().parse().ok()
}

/// Whether a leading `Other` line should be read as the timestamp. Non
/// numeric lines still are; small numbers are a count.
fn is_timestamp_line(line: &str) -> bool {
    match parse_timestamp(line) {
        Some(millis) => millis >= MIN_TIMESTAMP_MILLIS,
        None => parse_count(line).is_none(),
    }
}

/// A classified line of an export file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportLine {
    Timestamp(String),
    Checksum(String),
    Count(String),
    Address(String),
}

/// Line reader for export files. The first line is taken as the timestamp
/// unless it is checksum or address shaped or holds a count; every other line
/// that is neither becomes a [`ExportLine::Count`].
pub struct ExportLines<R> {
    lines: io::Lines<R>,
    first: bool,
}

pub fn read_lines<R: BufRead>(reader: R) -> ExportLines<R> {
    ExportLines {
        lines: reader.lines(),
        first: true,
    }
}

impl<R: BufRead> Iterator for ExportLines<R> {
    type Item = io::Result<ExportLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        let first = std::mem::replace(&mut self.first, false);

        Some(Ok(match classify_line(&line) {
            LineKind::Checksum => ExportLine::Checksum(line),
            LineKind::Address => ExportLine::Address(line),
            LineKind::Other if first && is_timestamp_line(&line) => ExportLine::Timestamp(line),
            LineKind::Other => ExportLine::Count(line),
        }))
    }
}

/// Streaming SHA-256 over raw address bytes, no separators
#[derive(Clone, Default)]
pub struct ChecksumAccumulator {
    hasher: Sha256,
    count: u64,
}

impl ChecksumAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
        self.count += 1;
    }

    /// Number of chunks fed so far
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Lowercase 64 character hex digest
    pub fn finalize(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

/// Checksum of an ordered address list
pub fn checksum_of<'a, I>(addresses: I) -> String
where
    I: IntoIterator<Item = &'a AddressHash>,
{
    let mut acc = ChecksumAccumulator::new();
    for address in addresses {
        acc.update(address.as_bytes());
    }
    acc.finalize()
}

/// Write a complete export body. `checksum` must already cover `addresses`.
pub fn write_export<W: Write>(
    writer: &mut W,
    generated_at: i64,
    checksum: &str,
    addresses: &[AddressHash],
) -> io::Result<()> {
    write!(writer, "{}{}", generated_at, LINE_SEPARATOR)?;
    write!(writer, "{}{}", checksum, LINE_SEPARATOR)?;
    write!(writer, "{}{}", addresses.len(), LINE_SEPARATOR)?;
    for address in addresses {
        write!(writer, "{}{}", address, LINE_SEPARATOR)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    fn address(c: char) -> AddressHash {
        AddressHash::parse(&c.to_string().repeat(ADDRESS_LENGTH)).unwrap()
    }

    #[test]
    fn test_classify_line_by_length() {
        assert_eq!(classify_line(EMPTY_SHA256), LineKind::Checksum);
        assert_eq!(classify_line(&"A".repeat(81)), LineKind::Address);
        assert_eq!(classify_line("1700000000000"), LineKind::Other);
        assert_eq!(classify_line("42"), LineKind::Other);
        assert_eq!(classify_line(""), LineKind::Other);
        assert_eq!(classify_line(&"A".repeat(80)), LineKind::Other);
        assert_eq!(classify_line(&"A".repeat(82)), LineKind::Other);
        assert_eq!(classify_line(&"f".repeat(65)), LineKind::Other);
    }

    #[test]
    fn test_classify_line_counts_characters_not_bytes() {
        let multibyte = format!("{}é{}", "a".repeat(11), "b".repeat(51));
        assert_eq!(multibyte.len(), CHECKSUM_LENGTH);
        assert_eq!(classify_line(&multibyte), LineKind::Other);

        let wide_address = format!("{}Ä", "A".repeat(80));
        assert_eq!(wide_address.chars().count(), ADDRESS_LENGTH);
        assert_eq!(classify_line(&wide_address), LineKind::Address);
        assert_eq!(classify_line(&format!("{}é", "a".repeat(63))), LineKind::Checksum);
    }

    #[test]
    fn test_parse_count_and_timestamp() {
        assert_eq!(parse_count("5"), Some(5));
        assert_eq!(parse_count(" 12 "), Some(12));
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("five"), None);
        assert_eq!(parse_timestamp("1700000000000"), Some(1_700_000_000_000));
    }

    #[test]
    fn test_empty_checksum() {
        assert_eq!(ChecksumAccumulator::new().finalize(), EMPTY_SHA256);
        assert_eq!(checksum_of(&Vec::<AddressHash>::new()), EMPTY_SHA256);
    }

    #[test]
    fn test_checksum_is_order_sensitive_concatenation() {
        let a = address('A');
        let b = address('B');

        let mut concat = Vec::new();
        concat.extend_from_slice(a.as_bytes());
        concat.extend_from_slice(b.as_bytes());
        let expected = hex::encode(Sha256::digest(&concat));

        assert_eq!(checksum_of(&[a.clone(), b.clone()]), expected);
        assert_ne!(checksum_of(&[b, a]), expected);
        assert_eq!(expected.len(), CHECKSUM_LENGTH);
    }

    #[test]
    fn test_read_lines_classifies_full_file() {
        let checksum = "a".repeat(64);
        let addr = "B".repeat(81);
        let text = format!("1700000000000\n{}\n1\n{}\n", checksum, addr);

        let lines: Vec<ExportLine> = read_lines(text.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            lines,
            vec![
                ExportLine::Timestamp("1700000000000".to_string()),
                ExportLine::Checksum(checksum),
                ExportLine::Count("1".to_string()),
                ExportLine::Address(addr),
            ]
        );
    }

    #[test]
    fn test_read_lines_without_timestamp_and_crlf() {
        let checksum = "c".repeat(64);
        let text = format!("{}\r\n0\r\n", checksum);

        let lines: Vec<ExportLine> = read_lines(text.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            lines,
            vec![
                ExportLine::Checksum(checksum),
                ExportLine::Count("0".to_string()),
            ]
        );
    }

    #[test]
    fn test_read_lines_leading_count_is_not_timestamp() {
        let checksum = "d".repeat(64);
        let text = format!("2\n{}\n", checksum);

        let lines: Vec<ExportLine> = read_lines(text.as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(
            lines,
            vec![
                ExportLine::Count("2".to_string()),
                ExportLine::Checksum(checksum),
            ]
        );

        let lines: Vec<ExportLine> = read_lines("not a number\n".as_bytes())
            .collect::<io::Result<_>>()
            .unwrap();
        assert_eq!(lines, vec![ExportLine::Timestamp("not a number".to_string())]);
    }

    #[test]
    fn test_write_export_layout() {
        let addresses = vec![address('A'), address('9')];
        let checksum = checksum_of(&addresses);
        let mut out = Vec::new();
        write_export(&mut out, 1_700_000_000_000, &checksum, &addresses).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "1700000000000");
        assert_eq!(lines[1], checksum);
        assert_eq!(lines[2], "2");
        assert_eq!(lines[3], addresses[0].as_str());
        assert_eq!(lines[4], addresses[1].as_str());
        assert!(text.ends_with(LINE_SEPARATOR));
    }
}
