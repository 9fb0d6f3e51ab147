//! Retry utilities for HTTP operations with exponential backoff.
//!
//! This module provides retry logic for transient failures:
//! - Timeouts
//! - Connection resets
//! - Responses whose status is on the configured allowlist (429, 500, 502, 503, 504 by default)
//!
//! Everything else is returned to the caller on the first attempt.

use std::future::Future;
use std::time::Duration;

use reqwest::{Response, StatusCode};
use weatherwave_core::HttpConfig;

/// Default retry configuration
pub const DEFAULT_MAX_RETRIES: u32 = 5;
pub const DEFAULT_INITIAL_DELAY_MS: u64 = 200;
pub const DEFAULT_MAX_DELAY_MS: u64 = 120_000;
pub const DEFAULT_RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries (doubles each attempt)
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Status codes worth another attempt
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_MAX_DELAY_MS),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

impl From<&HttpConfig> for RetryConfig {
    fn from(http: &HttpConfig) -> Self {
        Self {
            max_retries: http.retries,
            initial_delay: Duration::from_millis(http.backoff_factor_ms),
            max_delay: Duration::from_millis(http.max_backoff_ms),
            retry_statuses: http.retry_statuses.clone(),
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with custom settings and the default status allowlist
    pub fn new(max_retries: u32, initial_delay_ms: u64, max_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }

    /// Calculate the delay before retry number `attempt + 1`
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        // Exponential backoff: initial_delay * 2^attempt
        let factor = 2u64.saturating_pow(attempt);
        let delay_ms = (self.initial_delay.as_millis() as u64).saturating_mul(factor);
        let capped = delay_ms.min(self.max_delay.as_millis() as u64);
        Duration::from_millis(capped)
    }
}

/// Error classification for retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Should retry the request
    Retry,
    /// Should not retry - permanent failure
    NoRetry,
}

/// Check if a reqwest error is retryable
pub fn is_retryable_error(error: &reqwest::Error, allowlist: &[u16]) -> RetryDecision {
    if error.is_timeout() {
        tracing::debug!("Request timed out, will retry");
        return RetryDecision::Retry;
    }

    // Connection errors (reset, refused) are retryable
    if error.is_connect() {
        tracing::debug!("Connection error, will retry");
        return RetryDecision::Retry;
    }

    // Request errors (body issues) are not retryable
    if error.is_request() {
        tracing::debug!("Request error, not retryable");
        return RetryDecision::NoRetry;
    }

    if let Some(status) = error.status() {
        return is_retryable_status(status, allowlist);
    }

    RetryDecision::NoRetry
}

/// Check if a status code is on the retry allowlist
pub fn is_retryable_status(status: StatusCode, allowlist: &[u16]) -> RetryDecision {
    if allowlist.contains(&status.as_u16()) {
        tracing::debug!("Status {} is on the retry allowlist", status);
        RetryDecision::Retry
    } else {
        RetryDecision::NoRetry
    }
}

/// Execute an HTTP request with retry logic.
///
/// # Arguments
/// * `config` - Retry configuration
/// * `operation` - Async closure that performs the HTTP request
///
/// # Returns
/// The first non-retryable response, or the last response/error once retries run out.
/// A retryable status on the final attempt is returned as `Ok`; callers check the status.
///
/// # Example
/// ```ignore
/// let response = with_retry(
///     &RetryConfig::default(),
///     || async { client.get(url.clone()).send().await }
/// ).await?;
/// ```
pub async fn with_retry<F, Fut>(config: &RetryConfig, operation: F) -> Result<Response, reqwest::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<Response, reqwest::Error>>,
{
    let mut attempt: u32 = 0;

    loop {
        let has_budget = attempt < config.max_retries;

        match operation().await {
            Ok(response) => {
                let status = response.status();

                if !has_budget
                    || is_retryable_status(status, &config.retry_statuses) == RetryDecision::NoRetry
                {
                    if attempt > 0 {
                        tracing::info!("Request finished with {} after {} retries", status, attempt);
                    }
                    return Ok(response);
                }

                tracing::warn!(
                    "Request returned retryable status {}, attempt {} of {}",
                    status,
                    attempt + 1,
                    config.max_retries + 1
                );
            }
            Err(e) => {
                if is_retryable_error(&e, &config.retry_statuses) == RetryDecision::NoRetry {
                    tracing::debug!("Non-retryable error: {}", e);
                    return Err(e);
                }

                if !has_budget {
                    tracing::error!("All {} attempts exhausted", config.max_retries + 1);
                    return Err(e);
                }

                tracing::warn!(
                    "Retryable error on attempt {} of {}: {}",
                    attempt + 1,
                    config.max_retries + 1,
                    e
                );
            }
        }

        let delay = config.delay_for_attempt(attempt);
        tracing::info!(
            "Retry attempt {} of {}, waiting {:?}",
            attempt + 1,
            config.max_retries,
            delay
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_default() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_delay, Duration::from_millis(200));
        assert_eq!(config.max_delay, Duration::from_millis(120_000));
        assert_eq!(config.retry_statuses, vec![429, 500, 502, 503, 504]);
    }

    #[test]
    fn test_retry_config_from_http_config() {
        let http = HttpConfig {
            timeout_secs: 5,
            retries: 2,
            backoff_factor_ms: 10,
            max_backoff_ms: 50,
            retry_statuses: vec![503],
        };
        let config = RetryConfig::from(&http);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(10));
        assert_eq!(config.retry_statuses, vec![503]);
    }

    #[test]
    fn test_delay_calculation() {
        let config = RetryConfig::new(5, 200, 120_000);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(200));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(400));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(800));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(1600));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let config = RetryConfig::new(10, 100, 1000);

        // With 100ms initial and max 1000ms, 2^4 * 100 = 1600 > 1000
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(63), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(u32::MAX), Duration::from_millis(1000));
    }

    #[test]
    fn test_retryable_status_codes() {
        let allow = DEFAULT_RETRY_STATUSES;

        assert_eq!(is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR, &allow), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::BAD_GATEWAY, &allow), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE, &allow), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::GATEWAY_TIMEOUT, &allow), RetryDecision::Retry);
        assert_eq!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS, &allow), RetryDecision::Retry);

        // Off the allowlist, even though it is a server error
        assert_eq!(is_retryable_status(StatusCode::NOT_IMPLEMENTED, &allow), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::REQUEST_TIMEOUT, &allow), RetryDecision::NoRetry);

        assert_eq!(is_retryable_status(StatusCode::BAD_REQUEST, &allow), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::NOT_FOUND, &allow), RetryDecision::NoRetry);
        assert_eq!(is_retryable_status(StatusCode::OK, &allow), RetryDecision::NoRetry);
    }
}
