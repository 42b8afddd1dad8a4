//! Validity gate for lookup pages
//!
//! Decides from the lookup page alone whether an identifier is worth
//! traversing further. Rules, in order:
//! 1. A "record not found" or "record inactive" marker (case-insensitive)
//! 2. A "Power Units" figure equal to zero
//! 3. Otherwise valid

use crate::config::PatternConfig;
use crate::ConfigError;
use regex::Regex;
use std::fmt;

/// Why an identifier was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvalidReason {
    NotFound,
    Inactive,
    ZeroPowerUnits,
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            InvalidReason::NotFound => "not-found",
            InvalidReason::Inactive => "inactive",
            InvalidReason::ZeroPowerUnits => "zero-power-units",
        };
        f.write_str(reason)
    }
}

/// Verdict computed once per identifier from its lookup page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid(InvalidReason),
}

impl Verdict {
    pub fn is_valid(&self) -> bool {
        matches!(self, Verdict::Valid)
    }
}

#[derive(Debug, Clone)]
pub struct ValidityGate {
    not_found_marker: String,
    inactive_marker: String,
    power_units: Regex,
}

impl ValidityGate {
    pub fn from_config(config: &PatternConfig) -> Result<Self, ConfigError> {
        let power_units = Regex::new(&config.power_units).map_err(|e| {
            ConfigError::InvalidPattern(format!("'{}': {}", config.power_units, e))
        })?;

        Ok(Self {
            not_found_marker: config.not_found_marker.to_lowercase(),
            inactive_marker: config.inactive_marker.to_lowercase(),
            power_units,
        })
    }

    pub fn classify(&self, page: &str) -> Verdict {
        let lower = page.to_lowercase();
        if lower.contains(&self.not_found_marker) {
            return Verdict::Invalid(InvalidReason::NotFound);
        }
        if lower.contains(&self.inactive_marker) {
            return Verdict::Invalid(InvalidReason::Inactive);
        }

        if self.power_units(page) == Some(0) {
            return Verdict::Invalid(InvalidReason::ZeroPowerUnits);
        }

        Verdict::Valid
    }

    /// Parsed power units figure, ignoring thousands separators
    pub fn power_units(&self, page: &str) -> Option<u64> {
        let caps = self.power_units.captures(page)?;
        let digits: String = caps.get(1)?.as_str().chars().filter(|c| *c != ',').collect();
        digits.parse().ok()
    }
}
