//! Monetary types for fxgate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Currencies advertised by the `/currencies` endpoint, kept sorted.
pub const SUPPORTED_CURRENCIES: [&str; 10] = [
    "AUD", "BRL", "CAD", "CHF", "CNY", "EUR", "GBP", "INR", "JPY", "USD",
];

/// Longest code accepted from callers.
const MAX_CODE_LEN: usize = 8;

/// ISO 4217 style currency code, always uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Parse a caller-supplied code: trimmed, uppercased, ASCII letters only.
    pub fn parse(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();
        if code.is_empty()
            || code.len() > MAX_CODE_LEN
            || !code.chars().all(|c| c.is_ascii_alphabetic())
        {
            return Err(ValidationError::InvalidCurrency(code.to_string()));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// Get the currency code.
    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn usd() -> Self {
        Self("USD".to_string())
    }

    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn gbp() -> Self {
        Self("GBP".to_string())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// A directed currency pair: amounts in `from` are converted into `to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CurrencyPair {
    /// Source currency.
    pub from: Currency,
    /// Target currency.
    pub to: Currency,
}

impl CurrencyPair {
    /// Create a new currency pair.
    pub fn new(from: Currency, to: Currency) -> Self {
        Self { from, to }
    }

    /// Cache key for this pair, e.g. `EUR_USD`.
    pub fn key(&self) -> String {
        format!("{}_{}", self.from.code(), self.to.code())
    }

}

impl fmt::Display for CurrencyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// Parse a caller-supplied amount as an exact decimal.
///
/// Plain (`12.50`) and scientific (`1.5e3`) notation are accepted. The amount
/// must be strictly positive.
pub fn parse_amount(raw: &str) -> Result<Decimal, ValidationError> {
    let raw = raw.trim();
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| ValidationError::InvalidAmount)?;

    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount);
    }

    Ok(amount.normalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_currency_parse_uppercases() {
        let currency = Currency::parse(" eur ").unwrap();
        assert_eq!(currency.code(), "EUR");
        assert_eq!(currency, Currency::eur());
    }

    #[test]
    fn test_currency_parse_rejects_garbage() {
        assert!(matches!(
            Currency::parse(""),
            Err(ValidationError::InvalidCurrency(_))
        ));
        assert!(Currency::parse("US D").is_err());
        assert!(Currency::parse("U$D").is_err());
        assert!(Currency::parse("ABCDEFGHIJ").is_err());
    }

    #[test]
    fn test_pair_key() {
        let pair = CurrencyPair::new(Currency::eur(), Currency::usd());
        assert_eq!(pair.key(), "EUR_USD");
        assert_eq!(pair.to_string(), "EUR/USD");
    }

    #[test]
    fn test_supported_currencies_sorted() {
        let mut sorted = SUPPORTED_CURRENCIES;
        sorted.sort_unstable();
        assert_eq!(sorted, SUPPORTED_CURRENCIES);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100").unwrap(), dec!(100));
        assert_eq!(parse_amount("0.5").unwrap(), dec!(0.5));
        assert_eq!(parse_amount("1.5e3").unwrap(), dec!(1500));
    }

    #[test]
    fn test_parse_amount_errors() {
        assert_eq!(parse_amount("-5"), Err(ValidationError::NonPositiveAmount));
        assert_eq!(parse_amount("0"), Err(ValidationError::NonPositiveAmount));
        assert_eq!(parse_amount("abc"), Err(ValidationError::InvalidAmount));
        assert_eq!(parse_amount("NaN"), Err(ValidationError::InvalidAmount));
    }
}
