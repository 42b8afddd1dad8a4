//! Safer-Sweep main entry point
//!
//! This is the command-line interface for the Safer-Sweep contact resolver.

use clap::Parser;
use safer_sweep::config::{load_config, validate, Config, Mode};
use safer_sweep::crawler::{lookup_url, run_sweep, RunController};
use safer_sweep::input::load_identifiers;
use safer_sweep::output::print_statistics;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Safer-Sweep: bulk carrier contact resolution
///
/// Resolves each registry identifier in INPUT into a contact record by walking
/// the lookup, safety and registration pages, checkpointing results to
/// delimited files after every batch.
#[derive(Parser, Debug)]
#[command(name = "safer-sweep")]
#[command(version)]
#[command(about = "Bulk carrier contact resolution", long_about = None)]
struct Cli {
    /// Newline-delimited file of identifiers
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Maximum pipelines in flight per wave
    #[arg(long, env = "CONCURRENCY")]
    concurrency: Option<usize>,

    /// Pause between waves in milliseconds
    #[arg(long, env = "DELAY", value_name = "MS")]
    delay: Option<u64>,

    /// Identifiers per batch (one checkpoint per batch)
    #[arg(long, env = "BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Pause between batches in seconds
    #[arg(long, env = "WAIT_SECONDS")]
    wait_seconds: Option<u64>,

    /// Full extraction, or lookup URLs only
    #[arg(long, env = "MODE", value_enum)]
    mode: Option<Mode>,

    /// Directory receiving checkpoint files
    #[arg(short, long, env = "OUTPUT_DIR", value_name = "DIR")]
    output_dir: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show the schedule without fetching anything
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    /// Applies command-line and environment overrides on top of the file config
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(concurrency) = self.concurrency {
            config.run.concurrency = concurrency;
        }
        if let Some(delay) = self.delay {
            config.run.delay = delay;
        }
        if let Some(batch_size) = self.batch_size {
            config.run.batch_size = batch_size;
        }
        if let Some(wait_seconds) = self.wait_seconds {
            config.run.wait_seconds = wait_seconds;
        }
        if let Some(mode) = self.mode {
            config.run.mode = mode;
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).map_err(|e| {
                tracing::error!("Failed to load configuration: {}", e);
                e
            })?
        }
        None => Config::default(),
    };
    cli.apply_overrides(&mut config);
    validate(&config).map_err(|e| {
        tracing::error!("Invalid configuration: {}", e);
        e
    })?;

    let identifiers = load_identifiers(&cli.input).map_err(|e| {
        tracing::error!("{}", e);
        e
    })?;
    tracing::info!(
        "Loaded {} identifiers from {}",
        identifiers.len(),
        cli.input.display()
    );

    if cli.dry_run {
        handle_dry_run(&config, &identifiers)?;
    } else {
        handle_sweep(&config, &identifiers).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("safer_sweep=info,warn"),
            1 => EnvFilter::new("safer_sweep=debug,info"),
            2 => EnvFilter::new("safer_sweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the configuration and schedule
fn handle_dry_run(config: &Config, identifiers: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let controller = RunController::new(config)?;
    let plan = controller.plan(identifiers.len());

    println!("=== Safer-Sweep Dry Run ===\n");

    println!("Run Configuration:");
    println!("  Mode: {:?}", config.run.mode);
    println!("  Concurrency: {}", config.run.concurrency);
    println!("  Delay between waves: {}ms", config.run.delay);
    println!("  Batch size: {}", config.run.batch_size);
    println!("  Wait between batches: {}s", config.run.wait_seconds);

    println!("\nNetwork:");
    println!("  Lookup template: {}", config.network.lookup_url_template);
    println!("  Timeout: {}s", config.network.timeout_secs);
    println!(
        "  Attempts: {} (backoff base {}ms)",
        config.network.max_attempts, config.network.backoff_base_ms
    );

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    if let Some(latest) = &config.output.latest_file {
        println!("  Latest snapshot: {}", latest);
    }

    println!("\nSchedule:");
    println!("  Identifiers: {}", plan.identifiers);
    println!("  Batches: {}", plan.batches);
    println!("  Waves: {}", plan.waves);
    if let Some(first) = identifiers.first() {
        println!(
            "  First lookup: {}",
            lookup_url(&config.network.lookup_url_template, first)
        );
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the main sweep operation
async fn handle_sweep(config: &Config, identifiers: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    match run_sweep(config, identifiers).await {
        Ok(report) => {
            print_statistics(&report.statistics);
            if let Some(path) = &report.last_checkpoint {
                println!("\nResults: {}", path.display());
            }
            if let Some(path) = &report.url_list {
                println!("Lookup URLs: {}", path.display());
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!("Sweep failed: {}", e);
            Err(e.into())
        }
    }
}
