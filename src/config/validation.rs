use crate::config::types::{Config, NetworkConfig, OutputConfig, PatternConfig, RunConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Placeholder substituted with the percent-encoded identifier
pub const IDENTIFIER_PLACEHOLDER: &str = "{identifier}";

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_run_config(&config.run)?;
    validate_network_config(&config.network)?;
    validate_output_config(&config.output)?;
    validate_patterns(&config.patterns)?;
    Ok(())
}

fn validate_run_config(config: &RunConfig) -> Result<(), ConfigError> {
    if config.concurrency < 1 || config.concurrency > 100 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be between 1 and 100, got {}",
            config.concurrency
        )));
    }

    if config.batch_size < 1 {
        return Err(ConfigError::Validation(
            "batch-size must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_network_config(config: &NetworkConfig) -> Result<(), ConfigError> {
    if !config.lookup_url_template.contains(IDENTIFIER_PLACEHOLDER) {
        return Err(ConfigError::Validation(format!(
            "lookup-url-template must contain {}",
            IDENTIFIER_PLACEHOLDER
        )));
    }

    let sample = config.lookup_url_template.replace(IDENTIFIER_PLACEHOLDER, "0");
    let url = Url::parse(&sample).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid lookup-url-template '{}': {}",
            config.lookup_url_template, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "lookup-url-template must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(
            "max-attempts must be >= 1".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.results_prefix.is_empty() || config.urls_prefix.is_empty() {
        return Err(ConfigError::Validation(
            "output file prefixes cannot be empty".to_string(),
        ));
    }

    if let Some(latest) = &config.latest_file {
        if latest.is_empty() || latest.contains('/') || latest.contains('\\') {
            return Err(ConfigError::Validation(format!(
                "latest-file must be a plain file name, got '{}'",
                latest
            )));
        }
    }

    Ok(())
}

fn validate_patterns(config: &PatternConfig) -> Result<(), ConfigError> {
    if config.contact_class.trim().is_empty() {
        return Err(ConfigError::InvalidPattern(
            "contact-class cannot be empty".to_string(),
        ));
    }

    if config.not_found_marker.is_empty() || config.inactive_marker.is_empty() {
        return Err(ConfigError::InvalidPattern(
            "validity markers cannot be empty".to_string(),
        ));
    }

    let capturing = config
        .registry_number
        .iter()
        .chain(std::iter::once(&config.registry_fallback))
        .chain(std::iter::once(&config.power_units));
    for pattern in capturing {
        let regex = compile(pattern)?;
        if regex.captures_len() < 2 {
            return Err(ConfigError::InvalidPattern(format!(
                "pattern '{}' must have a capture group",
                pattern
            )));
        }
    }

    let plain = config
        .safety_link
        .iter()
        .chain(config.registration_link.iter())
        .chain(std::iter::once(&config.phone))
        .chain(std::iter::once(&config.email));
    for pattern in plain {
        compile(pattern)?;
    }

    Ok(())
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}
