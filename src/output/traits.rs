//! Result sink trait and accumulated result types
//!
//! This module defines the trait interface for checkpoint writers and the
//! append-only accumulator they snapshot.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Best-effort contact record for one identifier
///
/// Every field defaults to an empty string when it could not be extracted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactRecord {
    pub email: String,
    pub registry_number: String,
    pub phone: String,
    /// The lookup URL of the identifier, never a deeper hop
    pub source_url: String,
}

impl ContactRecord {
    /// A record carrying only its lookup URL
    pub fn url_only(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            ..Self::default()
        }
    }

    /// Field values in checkpoint column order
    pub fn columns(&self) -> [&str; 4] {
        [
            &self.email,
            &self.registry_number,
            &self.phone,
            &self.source_url,
        ]
    }
}

/// Results collected over the whole run
///
/// Both sequences only grow; nothing is removed or deduplicated.
#[derive(Debug, Clone, Default)]
pub struct RunAccumulator {
    records: Vec<ContactRecord>,
    lookup_urls: Vec<String>,
}

impl RunAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the record of a valid identifier along with its lookup URL
    pub fn push(&mut self, record: ContactRecord) {
        self.lookup_urls.push(record.source_url.clone());
        self.records.push(record);
    }

    pub fn records(&self) -> &[ContactRecord] {
        &self.records
    }

    pub fn lookup_urls(&self) -> &[String] {
        &self.lookup_urls
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Trait for checkpoint writers
///
/// A checkpoint always receives the full accumulator, never a delta.
pub trait ResultSink: Send + Sync {
    /// Writes a snapshot of every record accumulated so far
    ///
    /// # Returns
    ///
    /// The path of the snapshot file
    fn checkpoint(&self, accumulator: &RunAccumulator) -> OutputResult<PathBuf>;

    /// Writes the newline-delimited list of valid lookup URLs
    fn write_lookup_urls(&self, urls: &[String]) -> OutputResult<PathBuf>;
}
