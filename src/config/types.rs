use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Safer-Sweep
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
}

/// How deep each identifier is traversed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Full three-hop extraction of contact fields
    #[default]
    Both,
    /// Stop after the validity check and only collect lookup URLs
    Urls,
}

impl Mode {
    /// Returns true if hops 2 and 3 should be followed
    pub fn is_deep(&self) -> bool {
        matches!(self, Mode::Both)
    }
}

/// Batch and wave scheduling configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Maximum number of pipelines in flight per wave
    pub concurrency: usize,

    /// Pause between waves (milliseconds)
    pub delay: u64,

    /// Identifiers per batch; a checkpoint is written after each batch
    #[serde(rename = "batch-size")]
    pub batch_size: usize,

    /// Pause between batches (seconds)
    #[serde(rename = "wait-seconds")]
    pub wait_seconds: u64,

    pub mode: Mode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            concurrency: 6,
            delay: 300,
            batch_size: 500,
            wait_seconds: 0,
            mode: Mode::Both,
        }
    }
}

impl RunConfig {
    pub fn inter_wave_delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }

    pub fn inter_batch_wait(&self) -> Duration {
        Duration::from_secs(self.wait_seconds)
    }
}

/// Network access configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Lookup URL with an `{identifier}` placeholder
    #[serde(rename = "lookup-url-template")]
    pub lookup_url_template: String,

    /// Time bound for a single fetch attempt (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Attempts per fetch before giving up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// First backoff wait; doubles after every failed attempt (milliseconds)
    #[serde(rename = "backoff-base-ms")]
    pub backoff_base_ms: u64,

    /// Pause before following hop 2 and hop 3 (milliseconds)
    #[serde(rename = "hop-delay-ms")]
    pub hop_delay_ms: u64,

    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            lookup_url_template: "https://safer.fmcsa.dot.gov/query.asp?searchtype=ANY&query_type=queryCarrierSnapshot&query_param=MC_MX&query_string={identifier}".to_string(),
            timeout_secs: 20,
            max_attempts: 3,
            backoff_base_ms: 1000,
            hop_delay_ms: 250,
            user_agent: concat!("safer-sweep/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl NetworkConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn hop_delay(&self) -> Duration {
        Duration::from_millis(self.hop_delay_ms)
    }
}

/// Checkpoint output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving checkpoint files
    pub directory: String,

    /// File name prefix for timestamped result snapshots
    #[serde(rename = "results-prefix")]
    pub results_prefix: String,

    /// File name prefix for the lookup URL list (urls mode)
    #[serde(rename = "urls-prefix")]
    pub urls_prefix: String,

    /// Stable file name rewritten at every checkpoint; `None` disables it
    #[serde(rename = "latest-file")]
    pub latest_file: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "output".to_string(),
            results_prefix: "results".to_string(),
            urls_prefix: "lookup_urls".to_string(),
            latest_file: Some("results_latest.csv".to_string()),
        }
    }
}

/// Ordered pattern tables used by the page parser and validity gate
///
/// Each list is tried front to back; the first match wins.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    /// Registry number patterns, most specific first; group 1 captures the digits
    #[serde(rename = "registry-number")]
    pub registry_number: Vec<String>,

    /// Generic "MC-like number" pattern tried when the table above misses
    #[serde(rename = "registry-fallback")]
    pub registry_fallback: String,

    pub phone: String,

    pub email: String,

    /// Href substrings identifying the safety measurement page (hop 2)
    #[serde(rename = "safety-link")]
    pub safety_link: Vec<String>,

    /// Href patterns identifying the carrier registration page (hop 3)
    #[serde(rename = "registration-link")]
    pub registration_link: Vec<String>,

    /// Styling class carried by contact fields on the registration page
    #[serde(rename = "contact-class")]
    pub contact_class: String,

    /// Case-insensitive markers of a dead lookup
    #[serde(rename = "not-found-marker")]
    pub not_found_marker: String,

    #[serde(rename = "inactive-marker")]
    pub inactive_marker: String,

    /// Pattern locating the power units figure; group 1 captures the number
    #[serde(rename = "power-units")]
    pub power_units: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            registry_number: vec![
                r"(?is)MC/MX/FF\s*Number\(s\):?\s*(?:<[^>]*>\s*)*MC-?\s*(\d+)".to_string(),
                r"(?i)\bMC-(\d{3,})\b".to_string(),
                r"(?i)\bMC\s+(\d{3,})\b".to_string(),
            ],
            registry_fallback: r"\bMC[\s#:-]{0,3}(\d+)\b".to_string(),
            phone: r"\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]\d{4}\b".to_string(),
            email: r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}".to_string(),
            safety_link: vec![r"(?i)/SMS/Carrier/".to_string(), r"(?i)/SMS/".to_string()],
            registration_link: vec![
                r"(?i)/Carrier/\d+/CarrierRegistration\.aspx".to_string(),
                r"(?i)CarrierRegistration\.aspx".to_string(),
            ],
            contact_class: "dat".to_string(),
            not_found_marker: "record not found".to_string(),
            inactive_marker: "record inactive".to_string(),
            power_units: r"(?is)Power\s*Units:?\s*(?:<[^>]*>\s*)*([0-9][0-9,]*)".to_string(),
        }
    }
}
