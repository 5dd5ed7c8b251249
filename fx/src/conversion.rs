//! Currency conversion types and arithmetic.

use fxgate_common::{format_timestamp, Currency, CurrencyPair, Timestamp, ValidationError};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::error::{FxError, FxResult};

/// Fractional digits of every converted amount.
pub const CONVERTED_SCALE: u32 = 2;

/// Multiply `amount` by `rate` and round half-up to two decimal places.
///
/// Ties round away from zero (`0.005` becomes `0.01`), and the result always
/// carries exactly two fractional digits (`100.5` becomes `100.50`).
pub fn convert(amount: Decimal, rate: Decimal) -> FxResult<Decimal> {
    let raw = amount.checked_mul(rate).ok_or(FxError::Overflow)?;
    let mut rounded =
        raw.round_dp_with_strategy(CONVERTED_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(CONVERTED_SCALE);
    Ok(rounded)
}

/// A validated request to convert `amount` from one currency to another.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub pair: CurrencyPair,
    pub amount: Decimal,
}

impl ConversionRequest {
    /// Create a new conversion request. The amount must be positive.
    pub fn new(from: Currency, to: Currency, amount: Decimal) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveAmount);
        }
        Ok(Self {
            pair: CurrencyPair::new(from, to),
            amount,
        })
    }

    /// Build a request from raw query values.
    ///
    /// Absent and empty values both count as missing; missing parameters are
    /// reported before any value is parsed.
    pub fn parse(
        from: Option<&str>,
        to: Option<&str>,
        amount: Option<&str>,
    ) -> Result<Self, ValidationError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.map(str::trim).filter(|v| !v.is_empty())
        }

        let (Some(from), Some(to), Some(amount)) = (present(from), present(to), present(amount))
        else {
            return Err(ValidationError::MissingParameters);
        };

        let from = Currency::parse(from)?;
        let to = Currency::parse(to)?;
        let amount = fxgate_common::parse_amount(amount)?;

        Self::new(from, to, amount)
    }
}

/// Where the rate used for a conversion came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RateSource {
    /// Served from a fresh cache entry.
    Cache,
    /// Fetched from the upstream provider on this call.
    Provider,
}

/// Outcome of a successful conversion.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionResult {
    pub from: Currency,
    pub to: Currency,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub converted_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: Timestamp,
    #[serde(skip)]
    pub source: RateSource,
}

fn serialize_timestamp<S: serde::Serializer>(ts: &Timestamp, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(*ts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_convert_simple() {
        assert_eq!(convert(dec!(100), dec!(1.005)).unwrap(), dec!(100.50));
        assert_eq!(convert(dec!(100), dec!(1.005)).unwrap().to_string(), "100.50");
    }

    #[test]
    fn test_convert_rounds_tie_up() {
        // 0.5 * 0.01 = 0.005 exactly
        assert_eq!(convert(dec!(0.5), dec!(0.01)).unwrap(), dec!(0.01));
        assert_eq!(convert(dec!(1), dec!(2.345)).unwrap(), dec!(2.35));
        assert_eq!(convert(dec!(1), dec!(2.355)).unwrap(), dec!(2.36));
    }

    #[test]
    fn test_convert_rounds_below_tie_down() {
        assert_eq!(convert(dec!(1), dec!(2.3449)).unwrap(), dec!(2.34));
        assert_eq!(convert(dec!(3), dec!(0.001)).unwrap(), dec!(0.00));
    }

    #[test]
    fn test_convert_overflow() {
        let result = convert(Decimal::MAX, dec!(2));
        assert!(matches!(result, Err(FxError::Overflow)));
    }

    #[test]
    fn test_request_parse() {
        let request = ConversionRequest::parse(Some("eur"), Some("usd"), Some("100")).unwrap();
        assert_eq!(request.pair.key(), "EUR_USD");
        assert_eq!(request.amount, dec!(100));
    }

    #[test]
    fn test_request_parse_missing() {
        assert_eq!(
            ConversionRequest::parse(Some("EUR"), Some("USD"), None),
            Err(ValidationError::MissingParameters)
        );
        assert_eq!(
            ConversionRequest::parse(Some(""), Some("USD"), Some("abc")),
            Err(ValidationError::MissingParameters)
        );
        assert_eq!(
            ConversionRequest::parse(Some("EUR"), Some("  "), Some("1")),
            Err(ValidationError::MissingParameters)
        );
    }

    #[test]
    fn test_request_parse_invalid_values() {
        assert_eq!(
            ConversionRequest::parse(Some("EUR"), Some("USD"), Some("-5")),
            Err(ValidationError::NonPositiveAmount)
        );
        assert_eq!(
            ConversionRequest::parse(Some("EUR"), Some("USD"), Some("ten")),
            Err(ValidationError::InvalidAmount)
        );
        assert_eq!(
            ConversionRequest::parse(Some("E1R"), Some("USD"), Some("10")),
            Err(ValidationError::InvalidCurrency("E1R".into()))
        );
    }

    #[test]
    fn test_result_serializes_numbers() {
        let result = ConversionResult {
            from: Currency::eur(),
            to: Currency::usd(),
            amount: dec!(100),
            converted_amount: dec!(108.23),
            rate: dec!(1.0823),
            timestamp: chrono::DateTime::parse_from_rfc3339("2024-05-10T08:00:00Z")
                .unwrap()
                .with_timezone(&chrono::Utc),
            source: RateSource::Cache,
        };

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["from"], "EUR");
        assert_eq!(json["converted_amount"], 108.23);
        assert_eq!(json["rate"], 1.0823);
        assert_eq!(json["timestamp"], "2024-05-10T08:00:00Z");
        assert!(json.get("source").is_none());
    }

    proptest! {
        #[test]
        fn prop_convert_is_within_half_cent(
            amount_cents in 1i64..1_000_000_000,
            rate_micros in 1i64..100_000_000,
        ) {
            let amount = Decimal::new(amount_cents, 2);
            let rate = Decimal::new(rate_micros, 6);

            let converted = convert(amount, rate).unwrap();
            let raw = amount * rate;

            prop_assert_eq!(converted.scale(), CONVERTED_SCALE);
            prop_assert!((converted - raw).abs() <= dec!(0.005));
            // Exact ties always land on the larger magnitude.
            if raw.normalize().scale() == 3 && (raw * dec!(1000)) % dec!(10) == dec!(5) {
                prop_assert!(converted > raw);
            }
        }
    }
}
