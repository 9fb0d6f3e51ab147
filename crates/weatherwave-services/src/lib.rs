//! HTTP plumbing shared by the WeatherWave clients: retry policy and response cache.

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod cache;
pub mod error;
pub mod fetch;
pub mod retry;

pub use cache::ResponseCache;
pub use error::FetchError;
pub use fetch::HttpFetcher;
pub use retry::{with_retry, RetryConfig, RetryDecision};
