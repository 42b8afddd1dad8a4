//! Output module for checkpointing sweep results
//!
//! This module handles:
//! - The append-only accumulator of contact records and lookup URLs
//! - Writing full-snapshot checkpoint files after each batch
//! - Recording run statistics

mod checkpoint;
pub mod stats;
mod traits;

pub use checkpoint::{quote, render_records, render_url_list, CsvCheckpointSink, HEADER};
pub use stats::{print_statistics, RunStatistics};
pub use traits::{ContactRecord, OutputError, OutputResult, ResultSink, RunAccumulator};
