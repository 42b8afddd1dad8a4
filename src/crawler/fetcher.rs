//! HTTP fetcher implementation
//!
//! This module handles all network reads for the sweep, including:
//! - Building the HTTP client with redirect-following and a user agent
//! - Time-bounded single GET attempts
//! - Retry with exponential backoff across attempts
//!
//! A non-2xx status is treated like a network error and goes through the same
//! retry path.

use crate::config::NetworkConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::future::Future;
use std::time::Duration;

/// Source of raw page text
///
/// The sweep reaches the network only through this trait, which lets tests
/// serve fixture pages.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Performs a single fetch attempt and returns the body text
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The network configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &NetworkConfig) -> Result<Client, reqwest::Error> {
    let timeout = config.timeout();

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed page fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Builds a fetcher and its client from the network configuration
    pub fn from_config(config: &NetworkConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config)?, config.timeout()))
    }

    async fn fetch_once(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                }
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    source: e,
                }
            }
        })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        // Bounds the whole attempt, body included
        match tokio::time::timeout(self.timeout, self.fetch_once(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if let Some(status) = error.status() {
        FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Attempt cap and backoff schedule for one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff_base: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_base: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff_base,
        }
    }

    pub fn from_config(config: &NetworkConfig) -> Self {
        Self::new(config.max_attempts, config.backoff_base())
    }

    /// Attempt cap, never below one
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the failed attempt with 0-based index `attempt`: `base * 2^attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Fetches `url` with up to `policy.max_attempts()` sequential attempts
///
/// Exhausting every attempt yields [`FetchError::Exhausted`] tagged with
/// `label` and carrying the last observed error.
pub async fn fetch_with_retry<F>(
    fetcher: &F,
    url: &str,
    policy: &RetryPolicy,
    label: &str,
) -> Result<String, FetchError>
where
    F: PageFetcher + ?Sized,
{
    retry_with_backoff(policy, label, || fetcher.fetch_text(url)).await
}

/// Runs `operation` until it succeeds or the attempt cap is reached
///
/// After attempt `i` (0-indexed) fails and attempts remain, sleeps
/// `backoff_base * 2^i`. No jitter is applied.
pub async fn retry_with_backoff<T, Op, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut operation: Op,
) -> Result<T, FetchError>
where
    Op: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let attempts = policy.max_attempts();
    let mut attempt = 0;

    loop {
        tracing::debug!("{}: attempt {}/{}", label, attempt + 1, attempts);

        match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                if attempt + 1 >= attempts {
                    return Err(FetchError::Exhausted {
                        label: label.to_string(),
                        attempts,
                        source: Box::new(error),
                    });
                }

                let wait = policy.backoff(attempt);
                tracing::warn!(
                    "{}: attempt {}/{} failed ({}), retrying in {:?}",
                    label,
                    attempt + 1,
                    attempts,
                    error,
                    wait
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn transient(url: &str) -> FetchError {
        FetchError::Status {
            url: url.to_string(),
            status: 503,
        }
    }

    fn test_fetcher(timeout: Duration) -> HttpFetcher {
        let config = NetworkConfig {
            timeout_secs: 5,
            ..NetworkConfig::default()
        };
        HttpFetcher::new(build_http_client(&config).unwrap(), timeout)
    }

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client(&NetworkConfig::default()).is_ok());
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::new(4, Duration::from_millis(250));
        assert_eq!(policy.backoff(0), Duration::from_millis(250));
        assert_eq!(policy.backoff(1), Duration::from_millis(500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1000));
    }

    #[test]
    fn test_policy_has_at_least_one_attempt() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let policy = RetryPolicy::new(4, Duration::from_millis(100));
        let calls = AtomicU32::new(0);
        let start = Instant::now();

        let result = retry_with_backoff(&policy, "lookup 1", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(transient("https://example.com"))
                } else {
                    Ok("page")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "page");
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // 100ms after attempt 0, 200ms after attempt 1
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(300), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(310), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_surfaces_last_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(50));
        let calls = AtomicU32::new(0);

        let result: Result<(), FetchError> = retry_with_backoff(&policy, "lookup 2", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                Err(FetchError::Status {
                    url: "https://example.com".to_string(),
                    status: 500 + n as u16,
                })
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            FetchError::Exhausted {
                label,
                attempts,
                source,
            } => {
                assert_eq!(label, "lookup 2");
                assert_eq!(attempts, 3);
                assert!(matches!(*source, FetchError::Status { status: 502, .. }));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_final_attempt() {
        let policy = RetryPolicy::new(2, Duration::from_millis(100));
        let start = Instant::now();

        let result: Result<(), FetchError> =
            retry_with_backoff(&policy, "lookup 3", || async {
                Err(transient("https://example.com"))
            })
            .await;

        assert!(result.is_err());
        let waited = start.elapsed();
        assert!(waited < Duration::from_millis(200), "waited {:?}", waited);
    }

    #[tokio::test]
    async fn test_fetch_text_success() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(Duration::from_secs(5));
        let body = fetcher
            .fetch_text(&format!("{}/page", mock_server.uri()))
            .await
            .unwrap();
        assert_eq!(body, "<html>ok</html>");
    }

    #[tokio::test]
    async fn test_fetch_text_non_success_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(Duration::from_secs(5));
        let result = fetcher.fetch_text(&mock_server.uri()).await;
        assert!(matches!(result, Err(FetchError::Status { status: 500, .. })));
    }

    #[tokio::test]
    async fn test_fetch_text_times_out() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(Duration::from_millis(200));
        let result = fetcher.fetch_text(&mock_server.uri()).await;
        assert!(matches!(result, Err(FetchError::Timeout { .. })));
    }

    #[tokio::test]
    async fn test_fetch_with_retry_recovers_from_server_errors() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .expect(2)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let fetcher = test_fetcher(Duration::from_secs(5));
        let policy = RetryPolicy::new(3, Duration::from_millis(10));
        let body = fetch_with_retry(&fetcher, &mock_server.uri(), &policy, "lookup 4")
            .await
            .unwrap();
        assert_eq!(body, "recovered");
    }
}
