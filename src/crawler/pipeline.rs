//! Three-hop traversal for a single identifier
//!
//! lookup page -> safety page -> registration page
//!
//! Only the lookup hop may fail the identifier. Missing links end the walk
//! early, and fetch failures on hops 2 and 3 degrade to the record built so
//! far.

use crate::config::{Config, Mode, IDENTIFIER_PLACEHOLDER};
use crate::crawler::fetcher::{fetch_with_retry, PageFetcher, RetryPolicy};
use crate::crawler::gate::{InvalidReason, ValidityGate, Verdict};
use crate::crawler::parser::PageParser;
use crate::output::ContactRecord;
use crate::{ConfigError, FetchError};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::time::Duration;
use url::Url;

/// Result of traversing one identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Rejected by the validity gate; nothing past the lookup was fetched
    Invalid(InvalidReason),
    /// Passed the gate; carries the best-effort record
    Valid(ContactRecord),
}

/// Pipeline parameters taken from the run configuration
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub mode: Mode,
    pub lookup_url_template: String,
    pub retry: RetryPolicy,
    /// Pause before following hop 2 and hop 3
    pub hop_delay: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            mode: config.run.mode,
            lookup_url_template: config.network.lookup_url_template.clone(),
            retry: RetryPolicy::from_config(&config.network),
            hop_delay: config.network.hop_delay(),
        }
    }
}

/// Everything except RFC 3986 unreserved characters
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Substitutes the percent-encoded identifier into the lookup template
///
/// The identifier is encoded as a URL component, so the template may place
/// it in the query or in a path segment.
pub fn lookup_url(template: &str, identifier: &str) -> String {
    let encoded = utf8_percent_encode(identifier, COMPONENT).to_string();
    template.replace(IDENTIFIER_PLACEHOLDER, &encoded)
}

pub struct TraversalPipeline<F> {
    fetcher: F,
    parser: PageParser,
    gate: ValidityGate,
    settings: PipelineSettings,
}

impl<F: PageFetcher> TraversalPipeline<F> {
    pub fn new(
        fetcher: F,
        parser: PageParser,
        gate: ValidityGate,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            fetcher,
            parser,
            gate,
            settings,
        }
    }

    /// Builds the parser, gate and settings from configuration
    pub fn from_config(fetcher: F, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            fetcher,
            PageParser::from_config(&config.patterns)?,
            ValidityGate::from_config(&config.patterns)?,
            PipelineSettings::from_config(config),
        ))
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Traverses one identifier
    ///
    /// # Returns
    ///
    /// * `Ok(Outcome::Invalid)` - The lookup page failed the validity gate
    /// * `Ok(Outcome::Valid)` - Record with `source_url` set to the lookup URL
    /// * `Err(FetchError)` - The lookup page could not be fetched
    pub async fn traverse(&self, identifier: &str) -> Result<Outcome, FetchError> {
        let lookup = lookup_url(&self.settings.lookup_url_template, identifier);
        let page = fetch_with_retry(
            &self.fetcher,
            &lookup,
            &self.settings.retry,
            &format!("lookup {}", identifier),
        )
        .await?;

        if let Verdict::Invalid(reason) = self.gate.classify(&page) {
            return Ok(Outcome::Invalid(reason));
        }

        if !self.settings.mode.is_deep() {
            return Ok(Outcome::Valid(ContactRecord::url_only(lookup)));
        }

        let record = ContactRecord {
            email: String::new(),
            registry_number: self.parser.registry_number(&page),
            phone: self.parser.coarse_phone(&page),
            source_url: lookup.clone(),
        };

        Ok(Outcome::Valid(
            self.follow_hops(identifier, &lookup, &page, record).await,
        ))
    }

    /// Hops 2 and 3; every early exit returns the record built so far
    async fn follow_hops(
        &self,
        identifier: &str,
        lookup: &str,
        lookup_page: &str,
        mut record: ContactRecord,
    ) -> ContactRecord {
        let Some(safety_url) = Url::parse(lookup)
            .ok()
            .and_then(|base| self.parser.safety_link(lookup_page, &base))
        else {
            tracing::debug!("{}: no safety page link", identifier);
            return record;
        };

        tokio::time::sleep(self.settings.hop_delay).await;
        let safety_page = match fetch_with_retry(
            &self.fetcher,
            &safety_url,
            &self.settings.retry,
            &format!("safety {}", identifier),
        )
        .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("{}: safety page unavailable: {}", identifier, e);
                return record;
            }
        };

        let Some(registration_url) = Url::parse(&safety_url)
            .ok()
            .and_then(|base| self.parser.registration_link(&safety_page, &base))
        else {
            tracing::debug!("{}: no registration page link", identifier);
            return record;
        };

        tokio::time::sleep(self.settings.hop_delay).await;
        let registration_page = match fetch_with_retry(
            &self.fetcher,
            &registration_url,
            &self.settings.retry,
            &format!("registration {}", identifier),
        )
        .await
        {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("{}: registration page unavailable: {}", identifier, e);
                return record;
            }
        };

        let contact = self.parser.contact_fields(&registration_page);
        record.email = contact.email;
        if !contact.phone.is_empty() {
            record.phone = contact.phone;
        }

        record
    }
}
