//! Rate provider traits and implementations.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use fxgate_common::{constants, Currency, DurationExt};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::FetchError;

/// Trait for FX rate providers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current `from` → `to` rate. Single attempt, no retries.
    async fn fetch(&self, from: &Currency, to: &Currency) -> Result<Decimal, FetchError>;
}

/// Default upstream: the Frankfurter public API.
pub const DEFAULT_PROVIDER_URL: &str = "https://api.frankfurter.app/latest";

/// Configuration for [`HttpRateProvider`].
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Endpoint queried as `GET <base_url>?from=X&to=Y`.
    pub base_url: String,
    /// Bound on the whole request, connect through body.
    pub timeout: Duration,
}

impl Default for HttpProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            timeout: constants::provider_timeout().as_std(),
        }
    }
}

/// Upstream response body: `{ "rates": { "USD": 1.0823 } }`.
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, Value>,
}

/// Rate provider backed by an HTTP JSON API.
pub struct HttpRateProvider {
    client: Client,
    config: HttpProviderConfig,
}

impl HttpRateProvider {
    /// Create a provider with its own HTTP client.
    pub fn new(config: HttpProviderConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("fxgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    #[instrument(skip_all, fields(from = %from, to = %to))]
    async fn fetch(&self, from: &Currency, to: &Currency) -> Result<Decimal, FetchError> {
        let response = self
            .client
            .get(&self.config.base_url)
            .query(&[("from", from.code()), ("to", to.code())])
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(classify)?;
        let rate = parse_rate(&body, to)?;

        debug!(rate = %rate, "Fetched rate from upstream");
        Ok(rate)
    }
}

/// Map a transport error onto the fetch taxonomy.
fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else {
        FetchError::Network(err.to_string())
    }
}

/// Pull `rates[to]` out of an upstream body as an exact decimal.
///
/// The number is parsed from its JSON text (`serde_json` keeps it verbatim
/// with `arbitrary_precision`), never through `f64`.
pub fn parse_rate(body: &str, to: &Currency) -> Result<Decimal, FetchError> {
    let parsed: RatesResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let raw = match parsed.rates.get(to.code()) {
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => {
            return Err(FetchError::Malformed(format!(
                "rate for {to} is not numeric: {other}"
            )))
        }
        None => return Err(FetchError::MissingRate(to.code().to_string())),
    };

    let rate = Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .map_err(|e| FetchError::Malformed(format!("unparseable rate {raw}: {e}")))?;

    if rate <= Decimal::ZERO {
        return Err(FetchError::InvalidRate(rate));
    }

    Ok(rate)
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    rates: dashmap::DashMap<String, Decimal>,
    calls: std::sync::atomic::AtomicUsize,
    failure: parking_lot::Mutex<Option<FetchError>>,
    latency: parking_lot::Mutex<Option<Duration>>,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: dashmap::DashMap::new(),
            calls: std::sync::atomic::AtomicUsize::new(0),
            failure: parking_lot::Mutex::new(None),
            latency: parking_lot::Mutex::new(None),
        }
    }

    /// Set the rate returned for a pair.
    pub fn set_rate(&self, from: &str, to: &str, rate: Decimal) {
        self.rates.insert(format!("{from}_{to}"), rate);
    }

    /// Make every subsequent fetch fail with `error`, or succeed again with `None`.
    pub fn set_failure(&self, error: Option<FetchError>) {
        *self.failure.lock() = error;
    }

    /// Delay every fetch by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Number of fetches made so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, from: &Currency, to: &Currency) -> Result<Decimal, FetchError> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        self.rates
            .get(&format!("{}_{}", from.code(), to.code()))
            .map(|r| *r)
            .ok_or_else(|| FetchError::MissingRate(to.code().to_string()))
    }
}
