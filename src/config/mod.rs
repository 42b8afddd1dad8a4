//! Configuration module for Safer-Sweep
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so a sweep can run without any file at all.
//!
//! # Example
//!
//! ```no_run
//! use safer_sweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sweep.toml")).unwrap();
//! println!("Batch size: {}", config.run.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, Mode, NetworkConfig, OutputConfig, PatternConfig, RunConfig};

pub use parser::{load_config, parse_config};
pub use validation::{validate, IDENTIFIER_PLACEHOLDER};
