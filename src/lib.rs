//! Safer-Sweep: bulk carrier contact resolution
//!
//! This crate resolves a list of registry identifiers into contact records by
//! walking a small multi-hop website (lookup page, safety page, registration
//! page), extracting fields from raw markup at each hop, and checkpointing the
//! accumulated results to delimited files after every batch.

pub mod config;
pub mod crawler;
pub mod input;
pub mod output;

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Safer-Sweep operations
#[derive(Debug, Error)]
pub enum SweepError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Input file not found: {}", path.display())]
    InputMissing { path: PathBuf },

    #[error("Failed to read input file {}: {source}", path.display())]
    Input {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// Errors raised while fetching a single page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Network error for {url}: {source}")]
    Network { url: String, source: reqwest::Error },

    #[error("Failed to read body of {url}: {source}")]
    Body { url: String, source: reqwest::Error },

    #[error("{label}: giving up after {attempts} attempts: {source}")]
    Exhausted {
        label: String,
        attempts: u32,
        source: Box<FetchError>,
    },
}

/// Result type alias for Safer-Sweep operations
pub type Result<T> = std::result::Result<T, SweepError>;

// Re-export commonly used types
pub use config::{Config, Mode};
pub use crawler::{run_sweep, RunController};
pub use output::{ContactRecord, RunAccumulator};
