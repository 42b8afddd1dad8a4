//! Pattern-based field extraction over raw page text
//!
//! Pages are never parsed into a document tree. Every field is located by
//! regex search over the raw markup, driven by an ordered [`PatternTable`]:
//! - Registry number (ordered patterns, then a generic fallback)
//! - Coarse phone number anywhere on the page
//! - Follow links for the safety page (hop 2) and registration page (hop 3)
//! - Contact email and phone from class-marked elements, with whole-page
//!   fallbacks
//!
//! Absence of any field is not an error; it yields an empty string or `None`.

use crate::config::PatternConfig;
use crate::ConfigError;
use regex::Regex;
use scraper::Html;
use url::Url;

/// Compiled pattern tables, one ordered list per field
#[derive(Debug, Clone)]
pub struct PatternTable {
    registry_number: Vec<Regex>,
    registry_fallback: Regex,
    phone: Regex,
    email: Regex,
    safety_link: Vec<Regex>,
    registration_link: Vec<Regex>,
    contact_element: Regex,
    href: Regex,
}

impl PatternTable {
    /// Compiles the pattern strings from configuration
    pub fn from_config(config: &PatternConfig) -> Result<Self, ConfigError> {
        let class = regex::escape(config.contact_class.trim());
        let contact_element = format!(
            r#"(?is)<(?:span|td|div|li|p|label|strong|b)\b[^>]*\bclass\s*=\s*["'](?:[^"']*\s)?{}(?:\s[^"']*)?["'][^>]*>(.*?)</(?:span|td|div|li|p|label|strong|b)\s*>"#,
            class
        );

        Ok(Self {
            registry_number: compile_all(&config.registry_number)?,
            registry_fallback: compile(&config.registry_fallback)?,
            phone: compile(&config.phone)?,
            email: compile(&config.email)?,
            safety_link: compile_all(&config.safety_link)?,
            registration_link: compile_all(&config.registration_link)?,
            contact_element: compile(&contact_element)?,
            href: compile(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#)?,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("'{}': {}", pattern, e)))
}

fn compile_all(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns.iter().map(|p| compile(p)).collect()
}

/// One way of finding a contact field on the registration page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactStrategy {
    /// Text of the class-marked elements
    Structured,
    /// Generic regex over the whole raw page
    WholePage,
}

/// Default precedence for both email and phone
pub const DEFAULT_CONTACT_STRATEGIES: [ContactStrategy; 2] =
    [ContactStrategy::Structured, ContactStrategy::WholePage];

/// Contact fields found on the registration page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFields {
    pub email: String,
    pub phone: String,
}

/// Stateless field extractor
#[derive(Debug, Clone)]
pub struct PageParser {
    patterns: PatternTable,
    email_strategies: Vec<ContactStrategy>,
    phone_strategies: Vec<ContactStrategy>,
}

impl PageParser {
    pub fn new(patterns: PatternTable) -> Self {
        Self {
            patterns,
            email_strategies: DEFAULT_CONTACT_STRATEGIES.to_vec(),
            phone_strategies: DEFAULT_CONTACT_STRATEGIES.to_vec(),
        }
    }

    pub fn from_config(config: &PatternConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(PatternTable::from_config(config)?))
    }

    /// Replaces the strategy precedence used for email and phone
    pub fn with_strategies(
        mut self,
        email: Vec<ContactStrategy>,
        phone: Vec<ContactStrategy>,
    ) -> Self {
        self.email_strategies = email;
        self.phone_strategies = phone;
        self
    }

    /// Finds the registry number and normalizes it to `MC-<digits>`
    ///
    /// Returns an empty string when no pattern matches.
    pub fn registry_number(&self, page: &str) -> String {
        self.patterns
            .registry_number
            .iter()
            .chain(std::iter::once(&self.patterns.registry_fallback))
            .find_map(|pattern| {
                pattern
                    .captures(page)
                    .and_then(|caps| caps.get(1))
                    .map(|digits| format!("MC-{}", digits.as_str()))
            })
            .unwrap_or_default()
    }

    /// First phone-shaped substring anywhere on the page
    pub fn coarse_phone(&self, page: &str) -> String {
        first_match(&self.patterns.phone, page)
    }

    /// Absolute URL of the safety measurement page linked from `page`
    pub fn safety_link(&self, page: &str, base_url: &Url) -> Option<String> {
        self.follow_link(page, base_url, &self.patterns.safety_link)
    }

    /// Absolute URL of the carrier registration page linked from `page`
    pub fn registration_link(&self, page: &str, base_url: &Url) -> Option<String> {
        self.follow_link(page, base_url, &self.patterns.registration_link)
    }

    /// Extracts email and phone from the registration page
    ///
    /// Each field walks its strategy list and keeps the first non-empty value.
    pub fn contact_fields(&self, page: &str) -> ContactFields {
        let texts = self.contact_texts(page);

        let email = self
            .email_strategies
            .iter()
            .map(|strategy| match strategy {
                ContactStrategy::Structured => texts
                    .iter()
                    .find(|text| text.contains('@'))
                    .cloned()
                    .unwrap_or_default(),
                ContactStrategy::WholePage => first_match(&self.patterns.email, page),
            })
            .find(|value| !value.is_empty())
            .unwrap_or_default();

        let phone = self
            .phone_strategies
            .iter()
            .map(|strategy| match strategy {
                ContactStrategy::Structured => texts
                    .iter()
                    .find(|text| self.patterns.phone.is_match(text))
                    .cloned()
                    .unwrap_or_default(),
                ContactStrategy::WholePage => first_match(&self.patterns.phone, page),
            })
            .find(|value| !value.is_empty())
            .unwrap_or_default();

        ContactFields { email, phone }
    }

    /// De-tagged, whitespace-normalized text of every class-marked element
    fn contact_texts(&self, page: &str) -> Vec<String> {
        self.patterns
            .contact_element
            .captures_iter(page)
            .filter_map(|caps| caps.get(1))
            .map(|inner| detag(inner.as_str()))
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Pattern order wins over document order: the first pattern with any
    /// matching href decides, and within it the first href in the page.
    fn follow_link(&self, page: &str, base_url: &Url, patterns: &[Regex]) -> Option<String> {
        let hrefs = self.hrefs(page);

        patterns.iter().find_map(|pattern| {
            hrefs
                .iter()
                .filter(|href| pattern.is_match(href))
                .find_map(|href| resolve_link(href, base_url))
        })
    }

    fn hrefs(&self, page: &str) -> Vec<String> {
        self.patterns
            .href
            .captures_iter(page)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)).or_else(|| caps.get(3)))
            .map(|m| m.as_str().replace("&amp;", "&"))
            .collect()
    }
}

fn first_match(pattern: &Regex, text: &str) -> String {
    pattern
        .find(text)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// Strips tags from a markup fragment and collapses whitespace
fn detag(fragment: &str) -> String {
    let html = Html::parse_fragment(fragment);
    let text: String = html.root_element().text().collect::<Vec<_>>().join(" ");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Resolves an href against the page URL
///
/// Returns None for script, mail, phone, data and fragment-only links, and for
/// anything that does not resolve to http(s).
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url.to_string())
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
