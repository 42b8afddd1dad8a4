//! Delimited-file checkpoint writer
//!
//! Every checkpoint dumps the full accumulator to a new file whose name embeds
//! the wall-clock time. Earlier files stay behind as partial snapshots; the
//! last one written is the complete result. When configured, a stable
//! "latest" file is also replaced atomically at each checkpoint.

use crate::config::OutputConfig;
use crate::output::traits::{ContactRecord, OutputError, OutputResult, ResultSink, RunAccumulator};
use chrono::Local;
use std::fs;
use std::path::{Path, PathBuf};

/// Column header, in record column order
pub const HEADER: [&str; 4] = ["email", "registryNumber", "phone", "sourceURL"];

/// Writes quoted, comma-delimited checkpoint files into a directory
#[derive(Debug, Clone)]
pub struct CsvCheckpointSink {
    directory: PathBuf,
    results_prefix: String,
    urls_prefix: String,
    latest_file: Option<String>,
}

impl CsvCheckpointSink {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            directory: PathBuf::from(&config.directory),
            results_prefix: config.results_prefix.clone(),
            urls_prefix: config.urls_prefix.clone(),
            latest_file: config.latest_file.clone(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn ensure_directory(&self) -> OutputResult<()> {
        fs::create_dir_all(&self.directory).map_err(|source| OutputError::CreateDir {
            path: self.directory.clone(),
            source,
        })
    }

    /// Picks `<prefix>_<timestamp>.<ext>`, adding a counter if that name is taken
    fn timestamped_path(&self, prefix: &str, ext: &str) -> PathBuf {
        let stamp = Local::now().format("%Y%m%d_%H%M%S_%3f").to_string();
        let mut path = self.directory.join(format!("{}_{}.{}", prefix, stamp, ext));
        let mut counter = 1;
        while path.exists() {
            path = self
                .directory
                .join(format!("{}_{}_{}.{}", prefix, stamp, counter, ext));
            counter += 1;
        }
        path
    }

    fn replace_latest(&self, name: &str, contents: &str) -> OutputResult<()> {
        let target = self.directory.join(name);
        let temp = self.directory.join(format!(".{}.tmp", name));
        write_file(&temp, contents)?;
        fs::rename(&temp, &target).map_err(|source| OutputError::Write {
            path: target.clone(),
            source,
        })
    }
}

impl ResultSink for CsvCheckpointSink {
    fn checkpoint(&self, accumulator: &RunAccumulator) -> OutputResult<PathBuf> {
        self.ensure_directory()?;

        let contents = render_records(accumulator.records());
        let path = self.timestamped_path(&self.results_prefix, "csv");
        write_file(&path, &contents)?;

        if let Some(latest) = &self.latest_file {
            self.replace_latest(latest, &contents)?;
        }

        tracing::info!(
            "Checkpoint written: {} ({} records)",
            path.display(),
            accumulator.len()
        );
        Ok(path)
    }

    fn write_lookup_urls(&self, urls: &[String]) -> OutputResult<PathBuf> {
        self.ensure_directory()?;

        let path = self.timestamped_path(&self.urls_prefix, "txt");
        write_file(&path, &render_url_list(urls))?;

        tracing::info!("Lookup URL list written: {} ({} URLs)", path.display(), urls.len());
        Ok(path)
    }
}

fn write_file(path: &Path, contents: &str) -> OutputResult<()> {
    fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Renders the header and every record, each field quoted
pub fn render_records(records: &[ContactRecord]) -> String {
    let mut out = String::new();
    push_row(&mut out, &HEADER);
    for record in records {
        push_row(&mut out, &record.columns());
    }
    out
}

/// One URL per line, newline-terminated
pub fn render_url_list(urls: &[String]) -> String {
    let mut out = String::new();
    for url in urls {
        out.push_str(url);
        out.push('\n');
    }
    out
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&quote(field));
    }
    out.push('\n');
}

/// Wraps a field in quotes, doubling embedded quotes
pub fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
