//! FX engine error types.

use fxgate_common::{CurrencyPair, ValidationError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a single upstream rate fetch failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Connection or transport failure.
    #[error("network error: {0}")]
    Network(String),

    /// No response within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Upstream answered with a non-success status.
    #[error("upstream returned status {0}")]
    Status(u16),

    /// Body was not the expected JSON shape.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// Body had no rate for the target currency.
    #[error("no rate for {0} in response")]
    MissingRate(String),

    /// Rate was present but zero or negative.
    #[error("invalid rate {0}")]
    InvalidRate(Decimal),
}

/// Errors that can occur in the FX engine.
#[derive(Debug, Error)]
pub enum FxError {
    /// Rate could not be obtained for the requested pair.
    #[error("Rate not available for {pair}")]
    RateUnavailable {
        pair: CurrencyPair,
        #[source]
        source: FetchError,
    },

    /// A rate that must be positive was not.
    #[error("Invalid rate {rate} for {pair}")]
    InvalidRate { pair: CurrencyPair, rate: Decimal },

    /// `amount * rate` does not fit in a decimal.
    #[error("Conversion overflow")]
    Overflow,

    /// The conversion request itself was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
