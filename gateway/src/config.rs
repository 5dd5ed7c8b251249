//! Gateway configuration.

use std::time::Duration;

use fxgate_common::{constants, DurationExt};
use fxgate_fx::provider::DEFAULT_PROVIDER_URL;
use fxgate_fx::{FxEngineConfig, HttpProviderConfig, RateCacheConfig};

/// Upstream rate provider configuration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Endpoint queried as `GET <base_url>?from=X&to=Y`.
    pub base_url: String,
    /// Timeout for a single fetch.
    pub timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PROVIDER_URL.to_string(),
            timeout: constants::provider_timeout().as_std(),
        }
    }
}

/// Rate cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// How long a fetched rate may be served.
    pub freshness_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: constants::rate_freshness_window().as_std(),
        }
    }
}

/// Main gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Upstream provider configuration.
    pub provider: ProviderConfig,
    /// Cache configuration.
    pub cache: CacheConfig,
    /// Log level used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 5000,
            provider: ProviderConfig::default(),
            cache: CacheConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("GATEWAY_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("GATEWAY_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Some(url) = lookup("RATE_PROVIDER_URL") {
            config.provider.base_url = url;
        }

        if let Some(secs) = lookup("RATE_PROVIDER_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.provider.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(secs) = lookup("RATE_CACHE_TTL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.cache.freshness_window = Duration::from_secs(secs);
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        let url = &self.provider.base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!("Rate provider URL must be http(s): {url:?}"));
        }

        if self.provider.timeout.is_zero() {
            return Err("Rate provider timeout cannot be 0".to_string());
        }

        if self.cache.freshness_window.is_zero() {
            return Err("Cache freshness window cannot be 0".to_string());
        }

        Ok(())
    }

    /// Socket address string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// HTTP provider settings.
    pub fn http_provider(&self) -> HttpProviderConfig {
        HttpProviderConfig {
            base_url: self.provider.base_url.clone(),
            timeout: self.provider.timeout,
        }
    }

    /// FX engine settings.
    pub fn fx_engine(&self) -> FxEngineConfig {
        FxEngineConfig {
            cache: RateCacheConfig {
                freshness_window: chrono::Duration::from_std(self.cache.freshness_window)
                    .unwrap_or_else(|_| constants::rate_freshness_window()),
            },
        }
    }
}
