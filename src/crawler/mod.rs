//! Crawler module for identifier traversal
//!
//! This module contains the core sweep logic, including:
//! - HTTP fetching with retry and backoff
//! - Pattern-based field extraction from raw pages
//! - The validity gate for lookup pages
//! - The three-hop traversal pipeline
//! - Batch and wave scheduling
//! - Overall run coordination

mod coordinator;
mod fetcher;
mod gate;
mod parser;
mod pipeline;
mod scheduler;

#[cfg(test)]
mod testing;

pub use coordinator::{run_sweep, RunController, RunReport};
pub use fetcher::{
    build_http_client, fetch_with_retry, retry_with_backoff, HttpFetcher, PageFetcher,
    RetryPolicy,
};
pub use gate::{InvalidReason, ValidityGate, Verdict};
pub use parser::{ContactFields, ContactStrategy, PageParser, PatternTable};
pub use pipeline::{lookup_url, Outcome, PipelineSettings, TraversalPipeline};
pub use scheduler::{BatchScheduler, SchedulePlan, ScheduleSettings};
