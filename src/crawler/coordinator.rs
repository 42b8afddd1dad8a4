//! Run controller - end-to-end sweep orchestration
//!
//! Wires the configuration into a pipeline, scheduler and result sink, owns
//! the accumulator for the lifetime of the run, and writes the lookup URL list
//! at the end of a `urls` run.

use crate::config::{Config, Mode};
use crate::crawler::fetcher::{HttpFetcher, PageFetcher};
use crate::crawler::pipeline::TraversalPipeline;
use crate::crawler::scheduler::{BatchScheduler, SchedulePlan, ScheduleSettings};
use crate::output::{CsvCheckpointSink, ResultSink, RunAccumulator, RunStatistics};
use crate::SweepError;
use std::path::PathBuf;

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    pub accumulator: RunAccumulator,
    pub statistics: RunStatistics,
    /// The last checkpoint written; the authoritative output of the run
    pub last_checkpoint: Option<PathBuf>,
    /// Lookup URL list, written in `urls` mode only
    pub url_list: Option<PathBuf>,
}

pub struct RunController<F = HttpFetcher> {
    mode: Mode,
    pipeline: TraversalPipeline<F>,
    scheduler: BatchScheduler,
    sink: Box<dyn ResultSink>,
}

impl RunController<HttpFetcher> {
    /// Creates a controller that fetches over HTTP and writes checkpoint files
    pub fn new(config: &Config) -> Result<Self, SweepError> {
        let fetcher = HttpFetcher::from_config(&config.network)?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F: PageFetcher> RunController<F> {
    pub fn with_fetcher(config: &Config, fetcher: F) -> Result<Self, SweepError> {
        Ok(Self {
            mode: config.run.mode,
            pipeline: TraversalPipeline::from_config(fetcher, config)?,
            scheduler: BatchScheduler::new(ScheduleSettings::from_config(&config.run)),
            sink: Box::new(CsvCheckpointSink::new(&config.output)),
        })
    }

    /// Replaces the checkpoint writer
    pub fn with_sink(mut self, sink: Box<dyn ResultSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn plan(&self, identifiers: usize) -> SchedulePlan {
        self.scheduler.plan(identifiers)
    }

    /// Runs the sweep over `identifiers` in input order
    pub async fn run(&self, identifiers: &[String]) -> Result<RunReport, SweepError> {
        let plan = self.plan(identifiers.len());
        tracing::info!(
            "Sweeping {} identifiers in {} batches ({} waves), mode {:?}",
            plan.identifiers,
            plan.batches,
            plan.waves,
            self.mode
        );

        let mut accumulator = RunAccumulator::new();
        let mut statistics = RunStatistics::new();
        let start_time = std::time::Instant::now();

        let last_checkpoint = self
            .scheduler
            .run(
                identifiers,
                &self.pipeline,
                self.sink.as_ref(),
                &mut accumulator,
                &mut statistics,
            )
            .await?;

        if last_checkpoint.is_none() {
            tracing::warn!("No identifiers to process, no checkpoint written");
        }

        let url_list = if self.mode == Mode::Urls {
            Some(self.sink.write_lookup_urls(accumulator.lookup_urls())?)
        } else {
            None
        };

        tracing::info!(
            "Sweep completed: {} records from {} identifiers in {:?}",
            accumulator.len(),
            statistics.processed,
            start_time.elapsed()
        );

        Ok(RunReport {
            accumulator,
            statistics,
            last_checkpoint,
            url_list,
        })
    }
}

/// Runs a complete sweep with the HTTP fetcher and file checkpoints
///
/// # Example
///
/// ```no_run
/// use safer_sweep::config::Config;
/// use safer_sweep::crawler::run_sweep;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let ids = vec!["123456".to_string()];
/// let report = run_sweep(&Config::default(), &ids).await?;
/// println!("{} records", report.accumulator.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_sweep(config: &Config, identifiers: &[String]) -> Result<RunReport, SweepError> {
    RunController::new(config)?.run(identifiers).await
}
