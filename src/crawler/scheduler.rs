//! Two-level batch and wave scheduler
//!
//! This module handles:
//! - Splitting the identifier list into contiguous batches
//! - Dispatching each batch in waves of at most `concurrency` pipelines
//! - Merging wave outcomes into the accumulator in dispatch order
//! - Checkpointing after every batch
//! - Pacing between consecutive waves, with the inter-batch wait replacing
//!   the wave delay at batch boundaries when it is set
//!
//! Waves run strictly one after another, so the accumulator is only touched
//! by the control flow, never by the pipelines themselves.

use crate::config::RunConfig;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::pipeline::{Outcome, TraversalPipeline};
use crate::output::{ResultSink, RunAccumulator, RunStatistics};
use crate::SweepError;
use futures::future::join_all;
use std::path::PathBuf;
use std::time::Duration;

/// Batch and wave parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleSettings {
    pub batch_size: usize,
    pub concurrency: usize,
    pub inter_wave_delay: Duration,
    pub inter_batch_wait: Duration,
}

impl ScheduleSettings {
    pub fn from_config(config: &RunConfig) -> Self {
        Self {
            batch_size: config.batch_size,
            concurrency: config.concurrency,
            inter_wave_delay: config.inter_wave_delay(),
            inter_batch_wait: config.inter_batch_wait(),
        }
    }
}

/// Shape of a run: how many batches and waves a list of identifiers produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePlan {
    pub identifiers: usize,
    pub batches: usize,
    pub waves: usize,
}

pub struct BatchScheduler {
    settings: ScheduleSettings,
}

impl BatchScheduler {
    pub fn new(settings: ScheduleSettings) -> Self {
        Self {
            settings: ScheduleSettings {
                batch_size: settings.batch_size.max(1),
                concurrency: settings.concurrency.max(1),
                ..settings
            },
        }
    }

    pub fn settings(&self) -> &ScheduleSettings {
        &self.settings
    }

    /// Computes the batch and wave counts without running anything
    pub fn plan(&self, identifiers: usize) -> SchedulePlan {
        let batch_size = self.settings.batch_size;
        let concurrency = self.settings.concurrency;

        let full_batches = identifiers / batch_size;
        let remainder = identifiers % batch_size;
        let waves = full_batches * batch_size.div_ceil(concurrency) + remainder.div_ceil(concurrency);

        SchedulePlan {
            identifiers,
            batches: identifiers.div_ceil(batch_size),
            waves,
        }
    }

    /// Processes every identifier, checkpointing after each batch
    ///
    /// Per-identifier failures are logged and counted; only sink errors abort
    /// the run.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(path))` - Path of the last checkpoint written
    /// * `Ok(None)` - The identifier list was empty
    /// * `Err(SweepError)` - A checkpoint could not be written
    pub async fn run<F: PageFetcher>(
        &self,
        identifiers: &[String],
        pipeline: &TraversalPipeline<F>,
        sink: &dyn ResultSink,
        accumulator: &mut RunAccumulator,
        stats: &mut RunStatistics,
    ) -> Result<Option<PathBuf>, SweepError> {
        let batches: Vec<&[String]> = identifiers.chunks(self.settings.batch_size).collect();
        let total_batches = batches.len();
        let mut last_checkpoint = None;

        for (batch_index, batch) in batches.into_iter().enumerate() {
            tracing::info!(
                "Starting batch {}/{} ({} identifiers)",
                batch_index + 1,
                total_batches,
                batch.len()
            );

            let waves: Vec<&[String]> = batch.chunks(self.settings.concurrency).collect();
            let total_waves = waves.len();

            for (wave_index, wave) in waves.into_iter().enumerate() {
                self.run_wave(wave, pipeline, accumulator, stats).await;

                if wave_index + 1 < total_waves && !self.settings.inter_wave_delay.is_zero() {
                    tokio::time::sleep(self.settings.inter_wave_delay).await;
                }
            }

            last_checkpoint = Some(sink.checkpoint(accumulator)?);
            stats.record_checkpoint();
            stats.log_progress(identifiers.len());

            if batch_index + 1 < total_batches {
                if !self.settings.inter_batch_wait.is_zero() {
                    tracing::info!(
                        "Waiting {:?} before the next batch",
                        self.settings.inter_batch_wait
                    );
                    tokio::time::sleep(self.settings.inter_batch_wait).await;
                } else if !self.settings.inter_wave_delay.is_zero() {
                    tokio::time::sleep(self.settings.inter_wave_delay).await;
                }
            }
        }

        Ok(last_checkpoint)
    }

    /// Runs one wave concurrently and merges outcomes in dispatch order
    async fn run_wave<F: PageFetcher>(
        &self,
        wave: &[String],
        pipeline: &TraversalPipeline<F>,
        accumulator: &mut RunAccumulator,
        stats: &mut RunStatistics,
    ) {
        let outcomes = join_all(wave.iter().map(|id| pipeline.traverse(id))).await;

        for (identifier, outcome) in wave.iter().zip(outcomes) {
            match outcome {
                Ok(Outcome::Valid(record)) => {
                    tracing::info!(
                        "{}: registry={:?} phone={:?} email={:?}",
                        identifier,
                        record.registry_number,
                        record.phone,
                        record.email
                    );
                    stats.record_valid(&record);
                    accumulator.push(record);
                }
                Ok(Outcome::Invalid(reason)) => {
                    tracing::warn!("{}: skipped ({})", identifier, reason);
                    stats.record_invalid(reason);
                }
                Err(e) => {
                    tracing::error!("{}: {}", identifier, e);
                    stats.record_failure();
                }
            }
        }
    }
}
