//! Product identifier (ASIN) list loading and validation.
//!
//! Policy: lines are trimmed, blank lines are skipped, duplicates are kept
//! and processed independently. Any other line that is not purely ASCII
//! alphanumeric rejects the whole list.

use std::path::Path;

use serde::Serialize;

use crate::InputError;

/// An opaque alphanumeric product code, e.g. `B07XJ8C8F5`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validates a single, already-trimmed identifier.
    ///
    /// Returns `None` for empty input or input containing anything other
    /// than ASCII letters and digits.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric()) {
            return None;
        }
        Some(Self(raw.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifiers parsed from an input file, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierList {
    pub identifiers: Vec<Identifier>,
    /// Number of blank lines that were skipped.
    pub skipped_blank: usize,
}

/// Reads and validates an identifier file, one identifier per line.
///
/// # Errors
///
/// - [`InputError::Io`] if the file cannot be read.
/// - Any error from [`parse_identifiers`].
pub fn load_identifiers(path: &Path) -> Result<IdentifierList, InputError> {
    let content = std::fs::read_to_string(path).map_err(|e| InputError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_identifiers(&content)
}

/// Parses identifier-per-line text.
///
/// # Errors
///
/// - [`InputError::InvalidIdentifier`] for the first malformed line (1-based line number).
/// - [`InputError::NoIdentifiers`] if nothing remains after skipping blank lines.
pub fn parse_identifiers(content: &str) -> Result<IdentifierList, InputError> {
    let mut identifiers = Vec::new();
    let mut skipped_blank = 0usize;

    for (idx, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            skipped_blank += 1;
            continue;
        }
        let id = Identifier::parse(trimmed).ok_or_else(|| InputError::InvalidIdentifier {
            line: idx + 1,
            value: trimmed.to_owned(),
        })?;
        identifiers.push(id);
    }

    if skipped_blank > 0 {
        tracing::warn!(skipped_blank, "skipped blank lines in identifier list");
    }

    if identifiers.is_empty() {
        return Err(InputError::NoIdentifiers);
    }

    Ok(IdentifierList {
        identifiers,
        skipped_blank,
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn ids(list: &IdentifierList) -> Vec<&str> {
        list.identifiers.iter().map(Identifier::as_str).collect()
    }

    #[test]
    fn trims_whitespace_and_keeps_order() {
        let list = parse_identifiers("  B001\nB002  \r\n\tB003\n").unwrap();
        assert_eq!(ids(&list), vec!["B001", "B002", "B003"]);
        assert_eq!(list.skipped_blank, 0);
    }

    #[test]
    fn skips_blank_lines() {
        let list = parse_identifiers("B001\n\n   \nB002\n").unwrap();
        assert_eq!(ids(&list), vec!["B001", "B002"]);
        assert_eq!(list.skipped_blank, 2);
    }

    #[test]
    fn keeps_duplicates() {
        let list = parse_identifiers("B001\nB001\n").unwrap();
        assert_eq!(ids(&list), vec!["B001", "B001"]);
    }

    #[test]
    fn rejects_malformed_line_with_line_number() {
        let result = parse_identifiers("B001\nB0/02\n");
        assert!(
            matches!(result, Err(InputError::InvalidIdentifier { line: 2, ref value }) if value == "B0/02"),
            "expected InvalidIdentifier on line 2, got: {result:?}"
        );
    }

    #[test]
    fn rejects_inner_whitespace() {
        let result = parse_identifiers("B00 1\n");
        assert!(matches!(
            result,
            Err(InputError::InvalidIdentifier { line: 1, .. })
        ));
    }

    #[test]
    fn empty_or_blank_input_is_no_identifiers() {
        assert!(matches!(
            parse_identifiers(""),
            Err(InputError::NoIdentifiers)
        ));
        assert!(matches!(
            parse_identifiers("\n  \n"),
            Err(InputError::NoIdentifiers)
        ));
    }

    #[test]
    fn load_identifiers_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "B001").unwrap();
        writeln!(file, "B002").unwrap();
        let list = load_identifiers(file.path()).unwrap();
        assert_eq!(ids(&list), vec!["B001", "B002"]);
    }

    #[test]
    fn load_identifiers_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_identifiers(&dir.path().join("missing.txt"));
        assert!(matches!(result, Err(InputError::Io { .. })));
    }

    #[test]
    fn identifier_serializes_as_plain_string() {
        let id = Identifier::parse("B001").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"B001\"");
    }
}
