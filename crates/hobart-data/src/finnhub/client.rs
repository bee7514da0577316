//! Finnhub API client with rate limiting and 429 backoff.

use super::FinancialSource;
use super::payload::{ProfileData, SeriesPayload};
use crate::error::{DataError, Result};
use crate::types::Cadence;
use derive_more::From;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Finnhub API base URL
const FINNHUB_BASE_URL: &str = "https://finnhub.io/api/v1";

/// Default spacing between requests (free tier allows 60 calls per minute)
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_secs(1);

/// Default wait after a 429 when the response carries no `Retry-After`
const DEFAULT_RATE_LIMIT_BACKOFF: Duration = Duration::from_secs(60);

/// Default number of retries after a 429
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "FINNHUB_API_KEY";

/// Finnhub API token. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq, From)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a token.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Read `FINNHUB_API_KEY`, loading a `.env` file first if one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .map(Self)
            .ok_or(DataError::MissingApiKey)
    }

    /// The raw token, for building requests.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// True when no token was supplied.
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// How the client reacts to HTTP 429.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first rate-limited attempt
    pub max_retries: u32,
    /// Wait used when the response has no `Retry-After` header
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_RATE_LIMIT_BACKOFF,
        }
    }
}

/// Keeps requests at least `min_interval` apart.
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Finnhub API client.
#[derive(Debug)]
pub struct FinnhubClient {
    client: reqwest::Client,
    api_key: ApiKey,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    retry: RetryPolicy,
    base_url: String,
}

impl FinnhubClient {
    /// Create a client with the default request spacing and retry policy.
    pub fn new(api_key: ApiKey) -> Result<Self> {
        Self::with_rate_limit(api_key, DEFAULT_MIN_INTERVAL)
    }

    /// Create a client from `FINNHUB_API_KEY`.
    pub fn from_env() -> Result<Self> {
        Self::new(ApiKey::from_env()?)
    }

    /// Create a client with a custom minimum interval between requests.
    ///
    /// # Example
    /// ```no_run
    /// use hobart_data::finnhub::{ApiKey, FinnhubClient};
    /// use std::time::Duration;
    ///
    /// # fn example() -> hobart_data::Result<()> {
    /// // 2 requests per second
    /// let client = FinnhubClient::with_rate_limit(ApiKey::new("token"), Duration::from_millis(500))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_rate_limit(api_key: ApiKey, min_interval: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Network(e.without_url()))?;

        Ok(Self {
            client,
            api_key,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(min_interval))),
            retry: RetryPolicy::default(),
            base_url: FINNHUB_BASE_URL.to_string(),
        })
    }

    /// Replace the 429 retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Point the client at another host (e.g. a local mock server).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// GET an endpoint and decode the JSON body, retrying on 429.
    async fn get<T: DeserializeOwned>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T> {
        if self.api_key.is_empty() {
            return Err(DataError::MissingApiKey);
        }

        let url = self.url(endpoint);
        let mut retries = 0;

        loop {
            self.rate_limiter.lock().await.wait().await;

            // The token is part of the URL, so it is stripped from any error we keep.
            let response = self
                .client
                .get(&url)
                .query(query)
                .query(&[("token", self.api_key.expose())])
                .send()
                .await
                .map_err(|e| DataError::Network(e.without_url()))?;

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS {
                let wait = retry_after(&response).unwrap_or(self.retry.backoff);
                if retries >= self.retry.max_retries {
                    return Err(DataError::RateLimit {
                        retry_after_ms: wait.as_millis() as u64,
                    });
                }
                retries += 1;
                tracing::warn!(
                    endpoint,
                    retries,
                    wait_ms = wait.as_millis() as u64,
                    "rate limited by Finnhub, backing off"
                );
                sleep(wait).await;
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(DataError::Api(format!("HTTP {status} from {endpoint}: {text}")));
            }

            let text = response
                .text()
                .await
                .map_err(|e| DataError::Network(e.without_url()))?;
            tracing::debug!(endpoint, bytes = text.len(), "Finnhub response received");
            return Ok(serde_json::from_str(&text)?);
        }
    }

    /// Metric series names available for a symbol and cadence.
    pub async fn metric_keys(&self, symbol: &str, cadence: Cadence) -> Result<Vec<String>> {
        let payload = self.fetch_financial_series(symbol).await?;
        Ok(payload.metric_keys(cadence))
    }
}

impl FinancialSource for FinnhubClient {
    async fn fetch_profile(&self, symbol: &str) -> Result<ProfileData> {
        let symbol = validate_symbol(symbol)?;
        self.get("stock/profile2", &[("symbol", symbol.as_str())]).await
    }

    async fn fetch_financial_series(&self, symbol: &str) -> Result<SeriesPayload> {
        let symbol = validate_symbol(symbol)?;
        self.get("stock/metric", &[("symbol", symbol.as_str()), ("metric", "all")])
            .await
    }
}

fn validate_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(DataError::InvalidSymbol("Empty symbol".to_string()));
    }
    Ok(symbol.to_uppercase())
}

/// Parse a `Retry-After` header given in seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
