//! fxgate FX Engine
//!
//! Exchange rate lookup and currency conversion for the fxgate gateway.
//!
//! # Features
//!
//! - Upstream rate provider behind a trait, with an HTTP implementation
//! - Rate caching with a freshness window checked lazily on read
//! - Exact decimal conversion rounded half-up to two places
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use fxgate_fx::{ConversionRequest, FxEngine, FxEngineConfig, HttpRateProvider};
//!
//! let provider = Arc::new(HttpRateProvider::new(Default::default())?);
//! let engine = FxEngine::new(provider, FxEngineConfig::default());
//!
//! let request = ConversionRequest::parse(Some("EUR"), Some("USD"), Some("100"))?;
//! let result = engine.convert(&request).await?;
//! ```

pub mod engine;
pub mod provider;
pub mod cache;
pub mod conversion;
pub mod error;

pub use engine::{FxEngine, FxEngineConfig, FxEngineStats, RateLookup};
pub use provider::{HttpProviderConfig, HttpRateProvider, RateProvider};
pub use cache::{CachedRate, RateCache, RateCacheConfig};
pub use conversion::{convert, ConversionRequest, ConversionResult, RateSource};
pub use error::{FetchError, FxError, FxResult};

#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateProvider;
