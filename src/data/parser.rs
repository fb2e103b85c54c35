//! Decoder for exchange-rate provider payloads
//!
//! Turns the raw JSON body returned by the provider into a validated
//! `RateSnapshot`. Rates are read from the original JSON digits so no binary
//! floating point is involved.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

use super::{RateSnapshot, SnapshotError};

/// Errors that can occur when decoding a provider payload
#[derive(Debug, Error)]
pub enum ParseError {
    /// Body is not a JSON object of the expected shape
    #[error("Failed to parse JSON response: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The provider answered with an error object instead of rates
    #[error("Provider returned an error: {0}")]
    Provider(String),

    /// Missing expected field in response
    #[error("Missing expected field in response: {0}")]
    MissingField(&'static str),

    /// `date` is not a `YYYY-MM-DD` calendar date
    #[error("Invalid date format: {0}")]
    InvalidDate(String),

    /// A rate is not a decimal number this crate can represent
    #[error("Invalid rate for {code}: {value}")]
    InvalidRate { code: String, value: String },

    /// The rates are quoted against a different base than was requested
    #[error("Expected rates for base {expected}, provider returned {found}")]
    UnexpectedBase { expected: String, found: String },

    /// The decoded values break a snapshot invariant
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

/// Response body from the rates provider
#[derive(Debug, Deserialize)]
struct ProviderResponse {
    base: Option<String>,
    date: Option<String>,
    rates: Option<HashMap<String, serde_json::Number>>,
    /// Present instead of the fields above when the request was rejected
    error: Option<serde_json::Value>,
}

/// Parses a raw provider payload into a `RateSnapshot`
///
/// Rejects payloads missing `base`, `date` or `rates`, dates not matching
/// `YYYY-MM-DD`, and rates that are not positive decimal numbers.
pub fn parse_snapshot(payload: &[u8]) -> Result<RateSnapshot, ParseError> {
    let response: ProviderResponse = serde_json::from_slice(payload)?;

    if let Some(error) = response.error {
        let message = match error {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        return Err(ParseError::Provider(message));
    }

    let base = response.base.ok_or(ParseError::MissingField("base"))?;
    let date = response.date.ok_or(ParseError::MissingField("date"))?;
    let raw_rates = response.rates.ok_or(ParseError::MissingField("rates"))?;

    let as_of = parse_date(&date)?;

    let mut rates = HashMap::with_capacity(raw_rates.len());
    for (code, number) in raw_rates {
        let value = number.to_string();
        let rate = parse_decimal(&value).ok_or_else(|| ParseError::InvalidRate {
            code: code.clone(),
            value: value.clone(),
        })?;
        rates.insert(code, rate);
    }

    Ok(RateSnapshot::new(base, as_of, rates)?)
}

/// Parse a strict `YYYY-MM-DD` date string
fn parse_date(date_str: &str) -> Result<NaiveDate, ParseError> {
    let bytes = date_str.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_formed {
        return Err(ParseError::InvalidDate(date_str.to_string()));
    }

    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| ParseError::InvalidDate(date_str.to_string()))
}

/// Parse decimal text exactly, in plain or exponent notation (e.g. `1.5e-3`)
///
/// Text carrying more digits than a `Decimal` can hold is rejected rather
/// than rounded.
pub(crate) fn parse_decimal(value: &str) -> Option<Decimal> {
    Decimal::from_str_exact(value)
        .ok()
        .or_else(|| Decimal::from_scientific(value).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const SAMPLE: &str = r#"{
        "base": "USD",
        "date": "2024-03-08",
        "rates": {"EUR": 0.92, "JPY": 147.0381, "GBP": 0.7816}
    }"#;

    #[test]
    fn test_parse_valid_payload() {
        let snapshot = parse_snapshot(SAMPLE.as_bytes()).unwrap();

        assert_eq!(snapshot.base(), "USD");
        assert_eq!(snapshot.as_of(), NaiveDate::from_ymd_opt(2024, 3, 8).unwrap());
        assert_eq!(snapshot.rates().len(), 3);
        assert_eq!(snapshot.rate("EUR"), Some(dec!(0.92)));
        assert_eq!(snapshot.rate("JPY"), Some(dec!(147.0381)));
    }

    #[test]
    fn test_parse_keeps_full_precision() {
        let payload = r#"{"base":"USD","date":"2024-03-08","rates":{"IDR":15678.123456789012345}}"#;
        let snapshot = parse_snapshot(payload.as_bytes()).unwrap();

        assert_eq!(snapshot.rate("IDR"), Some(dec!(15678.123456789012345)));
    }

    #[test]
    fn test_parse_accepts_exponent_notation() {
        let payload = r#"{"base":"USD","date":"2024-03-08","rates":{"BTC":1.5e-5}}"#;
        let snapshot = parse_snapshot(payload.as_bytes()).unwrap();

        assert_eq!(snapshot.rate("BTC"), Some(dec!(0.000015)));
    }

    #[test]
    fn test_parse_rejects_missing_base() {
        let payload = r#"{"date":"2024-03-08","rates":{"EUR":0.92}}"#;
        let err = parse_snapshot(payload.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("base")));
    }

    #[test]
    fn test_parse_rejects_missing_date() {
        let payload = r#"{"base":"USD","rates":{"EUR":0.92}}"#;
        let err = parse_snapshot(payload.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("date")));
    }

    #[test]
    fn test_parse_rejects_missing_rates() {
        let payload = r#"{"base":"USD","date":"2024-03-08"}"#;
        let err = parse_snapshot(payload.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::MissingField("rates")));
    }

    #[test]
    fn test_parse_rejects_loose_date_formats() {
        for bad in ["2024-3-8", "08-03-2024", "2024/03/08", "2024-03-08T00:00", "2024-02-30"] {
            let payload = format!(r#"{{"base":"USD","date":"{}","rates":{{"EUR":0.92}}}}"#, bad);
            let err = parse_snapshot(payload.as_bytes()).unwrap_err();
            assert!(
                matches!(err, ParseError::InvalidDate(_)),
                "{} should be rejected, got {:?}",
                bad,
                err
            );
        }
    }

    #[test]
    fn test_parse_rejects_non_positive_rate() {
        let payload = r#"{"base":"USD","date":"2024-03-08","rates":{"EUR":0.92,"GBP":0}}"#;
        let err = parse_snapshot(payload.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            ParseError::Snapshot(SnapshotError::NonPositiveRate { .. })
        ));

        let payload = r#"{"base":"USD","date":"2024-03-08","rates":{"EUR":-1.5}}"#;
        assert!(parse_snapshot(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_rejects_string_rate() {
        let payload = r#"{"base":"USD","date":"2024-03-08","rates":{"EUR":"0.92"}}"#;
        let err = parse_snapshot(payload.as_bytes()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidJson(_)));
    }

    #[test]
    fn test_parse_rejects_empty_body() {
        assert!(matches!(
            parse_snapshot(b"").unwrap_err(),
            ParseError::InvalidJson(_)
        ));
    }

    #[test]
    fn test_parse_reports_provider_error() {
        let payload = r#"{"error":"Base 'XXX' is not supported."}"#;
        let err = parse_snapshot(payload.as_bytes()).unwrap_err();
        match err {
            ParseError::Provider(message) => assert!(message.contains("not supported")),
            other => panic!("expected provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_decimal_accepts_plain_and_exponent() {
        assert_eq!(parse_decimal("10.005"), Some(dec!(10.005)));
        assert_eq!(parse_decimal("1e2"), Some(dec!(100)));
        assert_eq!(parse_decimal("ten"), None);
    }

    #[test]
    fn test_parse_decimal_rejects_digits_beyond_precision() {
        assert_eq!(parse_decimal("0.00499999999999999999999999999999"), None);
        assert_eq!(
            parse_decimal("0.0049999999999999999999999999"),
            Some(dec!(0.0049999999999999999999999999))
        );
    }
}
