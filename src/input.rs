//! Identifier list loading
//!
//! The input is a newline-delimited text file. Each non-blank line holds one
//! identifier; surrounding whitespace is stripped and input order is kept.

use crate::SweepError;
use std::io::ErrorKind;
use std::path::Path;

/// Reads the identifier list from `path`
///
/// A missing file is reported as [`SweepError::InputMissing`] so the caller
/// can abort before any processing starts.
pub fn load_identifiers(path: &Path) -> Result<Vec<String>, SweepError> {
    let content = std::fs::read_to_string(path).map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            SweepError::InputMissing {
                path: path.to_path_buf(),
            }
        } else {
            SweepError::Input {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(parse_identifiers(&content))
}

/// Splits raw text into identifiers, skipping blank lines
pub fn parse_identifiers(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
