//! Run statistics
//!
//! Counters collected by the scheduler while merging wave outcomes, reported
//! after every batch and at the end of the run.

use crate::crawler::InvalidReason;
use crate::output::traits::ContactRecord;

/// Per-run outcome counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStatistics {
    /// Identifiers whose pipeline finished, whatever the outcome
    pub processed: u64,

    pub valid: u64,

    pub not_found: u64,
    pub inactive: u64,
    pub zero_power_units: u64,

    /// Identifiers whose lookup fetch failed after all retries
    pub failed: u64,

    pub with_email: u64,
    pub with_phone: u64,

    pub checkpoints: u64,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_valid(&mut self, record: &ContactRecord) {
        self.processed += 1;
        self.valid += 1;
        if !record.email.is_empty() {
            self.with_email += 1;
        }
        if !record.phone.is_empty() {
            self.with_phone += 1;
        }
    }

    pub fn record_invalid(&mut self, reason: InvalidReason) {
        self.processed += 1;
        match reason {
            InvalidReason::NotFound => self.not_found += 1,
            InvalidReason::Inactive => self.inactive += 1,
            InvalidReason::ZeroPowerUnits => self.zero_power_units += 1,
        }
    }

    pub fn record_failure(&mut self) {
        self.processed += 1;
        self.failed += 1;
    }

    pub fn record_checkpoint(&mut self) {
        self.checkpoints += 1;
    }

    pub fn invalid(&self) -> u64 {
        self.not_found + self.inactive + self.zero_power_units
    }

    /// Share of processed identifiers that passed the validity gate
    pub fn valid_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        (self.valid as f64 / self.processed as f64) * 100.0
    }

    pub fn log_progress(&self, total: usize) {
        tracing::info!(
            "Progress: {}/{} processed, {} valid, {} invalid, {} failed",
            self.processed,
            total,
            self.valid,
            self.invalid(),
            self.failed
        );
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &RunStatistics) {
    println!("=== Sweep Statistics ===\n");

    println!("Overview:");
    println!("  Identifiers processed: {}", stats.processed);
    println!("  Valid: {} ({:.1}%)", stats.valid, stats.valid_rate());
    println!("  Failed lookups: {}", stats.failed);
    println!();

    println!("Invalid by Reason:");
    println!("  not-found: {}", stats.not_found);
    println!("  inactive: {}", stats.inactive);
    println!("  zero-power-units: {}", stats.zero_power_units);
    println!();

    println!("Records:");
    println!("  With email: {}", stats.with_email);
    println!("  With phone: {}", stats.with_phone);
    println!("  Checkpoints written: {}", stats.checkpoints);
}
