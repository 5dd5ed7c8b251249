//! FX rate caching with a freshness window.

use chrono::Duration;
use dashmap::DashMap;
use fxgate_common::{constants, is_fresh_at, CurrencyPair, Timestamp};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::error::{FxError, FxResult};

/// A fetched rate and when it was fetched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CachedRate {
    pub pair: CurrencyPair,
    pub rate: Decimal,
    pub fetched_at: Timestamp,
}

/// Configuration for rate cache.
#[derive(Debug, Clone)]
pub struct RateCacheConfig {
    /// How long after a fetch an entry may be served.
    pub freshness_window: Duration,
}

impl Default for RateCacheConfig {
    fn default() -> Self {
        Self {
            freshness_window: constants::rate_freshness_window(),
        }
    }
}

/// Thread-safe rate cache keyed by pair key.
///
/// Staleness is only checked on read. Stale entries stay in the map until a
/// newer fetch overwrites them or the whole cache is cleared.
pub struct RateCache {
    cache: DashMap<String, CachedRate>,
    config: RateCacheConfig,
}

impl RateCache {
    /// Create a new rate cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(RateCacheConfig::default())
    }

    /// Create a new rate cache with custom configuration.
    pub fn with_config(config: RateCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get the entry for a pair, fresh or not.
    pub fn get(&self, pair: &CurrencyPair) -> Option<CachedRate> {
        self.cache.get(&pair.key()).map(|entry| entry.clone())
    }

    /// Get the entry for a pair only if it is fresh at `now`.
    pub fn get_fresh(&self, pair: &CurrencyPair, now: Timestamp) -> Option<CachedRate> {
        match self.get(pair) {
            Some(entry) if self.is_fresh(&entry, now) => {
                debug!(pair = %pair, "Cache hit");
                Some(entry)
            }
            Some(_) => {
                debug!(pair = %pair, "Cache entry stale");
                None
            }
            None => {
                debug!(pair = %pair, "Cache miss");
                None
            }
        }
    }

    /// Store a rate fetched at `now`, replacing any previous entry for the pair.
    pub fn put(&self, pair: &CurrencyPair, rate: Decimal, now: Timestamp) -> FxResult<()> {
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate {
                pair: pair.clone(),
                rate,
            });
        }

        let entry = CachedRate {
            pair: pair.clone(),
            rate,
            fetched_at: now,
        };
        self.cache.insert(pair.key(), entry);
        Ok(())
    }

    /// Whether `entry` may still be served at `now`.
    pub fn is_fresh(&self, entry: &CachedRate, now: Timestamp) -> bool {
        is_fresh_at(entry.fetched_at, now, self.config.freshness_window)
    }

    /// Clear all cached rates.
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fxgate_common::{now, Currency};
    use rust_decimal_macros::dec;

    fn eur_usd() -> CurrencyPair {
        CurrencyPair::new(Currency::eur(), Currency::usd())
    }

    #[test]
    fn test_cache_put_and_get() {
        let cache = RateCache::new();
        let pair = eur_usd();
        let fetched_at = now();

        cache.put(&pair, dec!(1.0823), fetched_at).unwrap();

        let cached = cache.get(&pair).unwrap();
        assert_eq!(cached.pair, pair);
        assert_eq!(cached.rate, dec!(1.0823));
        assert_eq!(cached.fetched_at, fetched_at);
    }

    #[test]
    fn test_cache_miss() {
        let cache = RateCache::new();
        assert!(cache.get(&eur_usd()).is_none());
        assert!(cache.get_fresh(&eur_usd(), now()).is_none());
    }

    #[test]
    fn test_freshness_boundary() {
        let cache = RateCache::new();
        let pair = eur_usd();
        let fetched_at = now();
        cache.put(&pair, dec!(1.1), fetched_at).unwrap();

        let entry = cache.get(&pair).unwrap();
        assert!(cache.is_fresh(&entry, fetched_at + Duration::seconds(3599)));
        assert!(!cache.is_fresh(&entry, fetched_at + Duration::seconds(3600)));
    }

    #[test]
    fn test_stale_entry_kept_until_overwritten() {
        let cache = RateCache::new();
        let pair = eur_usd();
        let fetched_at = now();
        cache.put(&pair, dec!(1.1), fetched_at).unwrap();

        let later = fetched_at + Duration::hours(2);
        assert!(cache.get_fresh(&pair, later).is_none());
        assert_eq!(cache.len(), 1);

        cache.put(&pair, dec!(1.2), later).unwrap();
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_fresh(&pair, later).unwrap().rate, dec!(1.2));
    }

    #[test]
    fn test_put_rejects_non_positive_rate() {
        let cache = RateCache::new();
        let result = cache.put(&eur_usd(), Decimal::ZERO, now());

        assert!(matches!(result, Err(FxError::InvalidRate { .. })));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_clear() {
        let cache = RateCache::new();
        cache.put(&eur_usd(), dec!(1.08), now()).unwrap();
        cache
            .put(&CurrencyPair::new(Currency::gbp(), Currency::usd()), dec!(1.27), now())
            .unwrap();

        assert_eq!(cache.len(), 2);

        cache.clear();

        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_custom_window() {
        let cache = RateCache::with_config(RateCacheConfig {
            freshness_window: Duration::seconds(60),
        });
        let pair = eur_usd();
        let fetched_at = now();
        cache.put(&pair, dec!(1.1), fetched_at).unwrap();

        assert!(cache.get_fresh(&pair, fetched_at + Duration::seconds(59)).is_some());
        assert!(cache.get_fresh(&pair, fetched_at + Duration::seconds(61)).is_none());
    }
}
