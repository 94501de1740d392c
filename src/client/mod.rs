//! Client Response Tier
//!
//! Caches JSON documents returned by an upstream API, with the same engine
//! the server uses for query results.
//!
//! Only documents reporting `"success": true` are stored. Anything else is
//! handed back to the caller but never cached.

use std::time::Duration;

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::cache::{generate_key, CacheStats, FetchStatus, TimedCache};
use crate::config::CacheConfig;
use crate::error::{CacheError, ClientError};

// == Request Options ==
/// Request parameters that take part in the cache key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOptions {
    pub method: Method,
    pub body: Option<String>,
}

impl RequestOptions {
    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            body: Some(body.into()),
        }
    }

    fn is_default(&self) -> bool {
        self.method == Method::GET && self.body.is_none()
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            body: None,
        }
    }
}

/// Cache key of a request: the bare URL for a plain GET, otherwise the URL
/// qualified by method and body.
pub fn request_key(url: &str, options: &RequestOptions) -> String {
    if options.is_default() {
        return url.to_string();
    }
    generate_key(
        url,
        [
            ("method", Value::from(options.method.as_str())),
            ("body", options.body.clone().map_or(Value::Null, Value::from)),
        ],
    )
}

// == Response Cache ==
/// Stale-while-revalidate cache in front of an HTTP API.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    cache: TimedCache<Value>,
    http: reqwest::Client,
}

impl ResponseCache {
    /// Creates a response cache with the client-tier defaults.
    pub fn new() -> Result<Self, CacheError> {
        Self::with_config(CacheConfig::client(), reqwest::Client::new())
    }

    /// Payloads are weighed by their serialized JSON length.
    pub fn with_config(config: CacheConfig, http: reqwest::Client) -> Result<Self, CacheError> {
        let cache = TimedCache::with_weigher(config, |value: &Value| {
            serde_json::to_vec(value).map(|bytes| bytes.len()).unwrap_or(0)
        })?;
        Ok(Self { cache, http })
    }

    /// The underlying engine, e.g. to start its sweep task.
    pub fn cache(&self) -> &TimedCache<Value> {
        &self.cache
    }

    // == Fetch With Cache ==
    /// Fetches `url`, serving cached documents stale-while-revalidate.
    ///
    /// `ttl` defaults to the tier's default TTL. An unsuccessful document is
    /// returned on a miss without being cached; during a background refresh
    /// it counts as a failed refresh.
    pub async fn fetch_with_cache(
        &self,
        url: &str,
        options: &RequestOptions,
        ttl: Option<Duration>,
    ) -> Result<Value, ClientError> {
        let key = request_key(url, options);
        let ttl = ttl.unwrap_or(self.cache.config().default_ttl);

        let http = self.http.clone();
        let request_url = url.to_string();
        let request_options = options.clone();
        let producer = move || async move { send(&http, &request_url, &request_options).await };

        match self.cache.fetch(&key, producer, ttl).await {
            Ok(fetched) => {
                if fetched.status == FetchStatus::Stale {
                    debug!(url = %url, "Serving stale response while revalidating");
                }
                Ok(fetched.value)
            }
            Err(ClientError::Unsuccessful(document)) => Ok(document),
            Err(e) => Err(e),
        }
    }

    // == Mutate ==
    /// Updates or drops the cached document of a request, then optionally
    /// revalidates it against the upstream.
    ///
    /// With `updater`, a cached document is replaced by `updater(&current)`
    /// for the default TTL; without one the entry is invalidated.
    /// Revalidation failures are logged and not returned.
    pub async fn mutate<F>(
        &self,
        url: &str,
        options: &RequestOptions,
        updater: Option<F>,
        revalidate: bool,
    ) -> Result<(), ClientError>
    where
        F: FnOnce(&Value) -> Value,
    {
        let key = request_key(url, options);

        match updater {
            Some(update) => {
                if let Some(current) = self.cache.get(&key).await {
                    self.cache.set_default(key.as_str(), update(&current)).await?;
                }
            }
            None => {
                self.cache.invalidate(&key).await;
            }
        }

        if revalidate {
            match send(&self.http, url, options).await {
                Ok(document) => self.cache.set_default(key, document).await?,
                Err(ClientError::Unsuccessful(_)) => {
                    warn!(url = %url, "Revalidation returned an unsuccessful response");
                }
                Err(e) => error!(url = %url, error = %e, "Revalidation failed"),
            }
        }
        Ok(())
    }

    pub async fn invalidate(&self, url: &str, options: &RequestOptions) -> bool {
        self.cache.invalidate(&request_key(url, options)).await
    }

    pub async fn invalidate_pattern(&self, pattern: &str) -> Result<usize, CacheError> {
        self.cache.invalidate_pattern(pattern).await
    }

    pub async fn clear(&self) -> usize {
        self.cache.clear().await
    }

    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }
}

/// Performs one upstream request and returns its successful JSON document.
async fn send(
    http: &reqwest::Client,
    url: &str,
    options: &RequestOptions,
) -> Result<Value, ClientError> {
    let mut request = http.request(options.method.clone(), url);
    if let Some(body) = &options.body {
        request = request
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body.clone());
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        });
    }

    let document: Value = response.json().await?;
    if document.get("success").and_then(Value::as_bool) == Some(true) {
        Ok(document)
    } else {
        Err(ClientError::Unsuccessful(document))
    }
}
