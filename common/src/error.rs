//! Error types shared across fxgate crates.

use thiserror::Error;

/// Problems with a caller-supplied conversion request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more of `from`, `to`, `amount` is absent or empty.
    #[error("missing required parameters")]
    MissingParameters,

    /// Amount could not be parsed as a decimal number.
    #[error("invalid amount")]
    InvalidAmount,

    /// Amount parsed but is zero or negative.
    #[error("amount must be positive")]
    NonPositiveAmount,

    /// Currency code is empty or contains non-letters.
    #[error("invalid currency code: {0}")]
    InvalidCurrency(String),

    /// Converted amount does not fit in a decimal.
    #[error("amount too large")]
    AmountTooLarge,
}

impl ValidationError {
    /// Parameters every conversion request must carry.
    pub const REQUIRED_PARAMETERS: [&'static str; 3] = ["from", "to", "amount"];

    /// Example of a well-formed conversion request.
    pub const EXAMPLE: &'static str = "/convert?from=EUR&to=USD&amount=100";

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::MissingParameters => "MISSING_PARAMETERS",
            ValidationError::InvalidAmount => "INVALID_AMOUNT",
            ValidationError::NonPositiveAmount => "NON_POSITIVE_AMOUNT",
            ValidationError::InvalidCurrency(_) => "INVALID_CURRENCY",
            ValidationError::AmountTooLarge => "AMOUNT_TOO_LARGE",
        }
    }
}
