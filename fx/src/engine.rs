//! Main FX engine implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use fxgate_common::{now, CurrencyPair, Timestamp};
use tracing::{debug, info, instrument};

use crate::cache::{CachedRate, RateCache, RateCacheConfig};
use crate::conversion::{convert, ConversionRequest, ConversionResult, RateSource};
use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;

/// Configuration for the FX engine.
#[derive(Debug, Clone, Default)]
pub struct FxEngineConfig {
    /// Cache configuration.
    pub cache: RateCacheConfig,
}

/// A rate ready to be applied, and where it came from.
#[derive(Debug, Clone)]
pub struct RateLookup {
    pub entry: CachedRate,
    pub source: RateSource,
}

/// Looks rates up in the cache, falls back to the provider, and converts.
pub struct FxEngine {
    provider: Arc<dyn RateProvider>,
    cache: RateCache,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FxEngine {
    /// Create a new FX engine with the given provider.
    pub fn new(provider: Arc<dyn RateProvider>, config: FxEngineConfig) -> Self {
        Self {
            provider,
            cache: RateCache::with_config(config.cache),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Get the current rate for a currency pair.
    pub async fn get_rate(&self, pair: &CurrencyPair) -> FxResult<RateLookup> {
        self.get_rate_at(pair, now()).await
    }

    /// Get the rate for a pair as of `now`.
    ///
    /// A fresh cache entry is returned as is. Otherwise the provider is asked
    /// once; on success the cache entry is replaced, on failure the cache is
    /// left untouched.
    #[instrument(skip_all, fields(pair = %pair))]
    pub async fn get_rate_at(&self, pair: &CurrencyPair, now: Timestamp) -> FxResult<RateLookup> {
        if let Some(entry) = self.cache.get_fresh(pair, now) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            info!(from_currency = %pair.from, to_currency = %pair.to, "Cache hit");
            return Ok(RateLookup {
                entry,
                source: RateSource::Cache,
            });
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let rate = self
            .provider
            .fetch(&pair.from, &pair.to)
            .await
            .map_err(|source| FxError::RateUnavailable {
                pair: pair.clone(),
                source,
            })?;

        self.cache.put(pair, rate, now)?;

        info!(
            from_currency = %pair.from,
            to_currency = %pair.to,
            rate = %rate,
            provider = self.provider.name(),
            "Rate fetched from provider"
        );

        Ok(RateLookup {
            entry: CachedRate {
                pair: pair.clone(),
                rate,
                fetched_at: now,
            },
            source: RateSource::Provider,
        })
    }

    /// Convert an amount using the current rate.
    pub async fn convert(&self, request: &ConversionRequest) -> FxResult<ConversionResult> {
        self.convert_at(request, now()).await
    }

    /// Convert an amount using the rate as of `now`.
    pub async fn convert_at(
        &self,
        request: &ConversionRequest,
        now: Timestamp,
    ) -> FxResult<ConversionResult> {
        let lookup = self.get_rate_at(&request.pair, now).await?;
        let converted_amount = convert(request.amount, lookup.entry.rate)?;

        debug!(
            pair = %request.pair,
            amount = %request.amount,
            converted_amount = %converted_amount,
            "Conversion computed"
        );

        Ok(ConversionResult {
            from: request.pair.from.clone(),
            to: request.pair.to.clone(),
            amount: request.amount,
            converted_amount,
            rate: lookup.entry.rate,
            timestamp: now,
            source: lookup.source,
        })
    }

    /// The underlying rate cache.
    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Drop every cached rate.
    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Cache cleared");
    }

    /// Get engine statistics.
    pub fn stats(&self) -> FxEngineStats {
        FxEngineStats {
            cache_size: self.cache.len(),
            cache_hits: self.hits.load(Ordering::Relaxed),
            cache_misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Engine statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxEngineStats {
    pub cache_size: usize,
    pub cache_hits: u64,
    pub cache_misses: u64,
}

impl FxEngineStats {
    /// Share of lookups served from cache; zero before any lookup.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            return 0.0;
        }
        self.cache_hits as f64 / total as f64
    }
}
