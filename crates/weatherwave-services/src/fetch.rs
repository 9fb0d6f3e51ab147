//! Cached, retrying HTTP GET.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use url::Url;
use weatherwave_core::{Config, HttpConfig};

use crate::cache::ResponseCache;
use crate::error::FetchError;
use crate::retry::{with_retry, RetryConfig};

fn open_cache(dir: &Path, expire_after_secs: u64) -> Option<ResponseCache> {
    match ResponseCache::new(dir, Duration::from_secs(expire_after_secs)) {
        Ok(cache) => {
            let purged = cache.purge_expired();
            if purged > 0 {
                tracing::debug!("Purged {} expired cache entries", purged);
            }
            Some(cache)
        }
        Err(e) => {
            tracing::warn!(
                "Response cache unavailable at {} ({}); fetching uncached",
                dir.display(),
                e
            );
            None
        }
    }
}

/// GET client combining the response cache with the retry policy.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Arc<Client>,
    retry: RetryConfig,
    cache: Option<ResponseCache>,
}

impl HttpFetcher {
    pub fn new(
        http: &HttpConfig,
        user_agent: &str,
        cache: Option<ResponseCache>,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client: Arc::new(client),
            retry: RetryConfig::from(http),
            cache,
        })
    }

    /// Fetcher for the forecast API, with the cache enabled per configuration.
    ///
    /// Expired entries are purged on open. A cache directory that cannot be
    /// created leaves the fetcher uncached.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let cache = if config.cache.enabled {
            open_cache(&config.cache_dir(), config.cache.expire_after_secs)
        } else {
            None
        };
        let user_agent = format!("weatherwave/{}", env!("CARGO_PKG_VERSION"));
        Self::new(&config.http, &user_agent, cache)
    }

    /// GET `url` and return the body text.
    ///
    /// Served from the cache when a fresh entry exists. Otherwise the request runs
    /// under the retry policy, and a non-success final status is an error.
    pub async fn get_text(&self, url: &Url) -> Result<String, FetchError> {
        let key = ResponseCache::key("GET", url);

        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(&key) {
                return Ok(body);
            }
        }

        tracing::debug!("GET {}", url);
        let response = with_retry(&self.retry, || async {
            self.client.get(url.clone()).send().await
        })
        .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("GET {} failed with {}", url, status);
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
                body,
            });
        }

        let body = response.text().await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, url, &body) {
                tracing::warn!("Response not cached: {}", e);
            }
        }

        Ok(body)
    }
}
