//! Core data model for exchange-rate snapshots
//!
//! This module contains the immutable `RateSnapshot` type along with the
//! provider client (`fetcher`) and payload decoder (`parser`) that produce it.

pub mod fetcher;
pub mod parser;

pub use fetcher::{FetchConfig, FetchError, Fetcher, HttpFetcher};
pub use parser::{parse_snapshot, ParseError};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use thiserror::Error;

/// Violations of the snapshot invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// The base currency code is empty
    #[error("Snapshot base currency is empty")]
    EmptyBase,

    /// A rate is zero or negative
    #[error("Rate for {code} must be positive, got {rate}")]
    NonPositiveRate { code: String, rate: Decimal },
}

/// One fetched table of exchange rates
///
/// `rates` maps a currency code to the number of units of that currency
/// one unit of `base` buys. A snapshot is never mutated after construction;
/// newer data replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateSnapshot {
    base: String,
    as_of: NaiveDate,
    rates: HashMap<String, Decimal>,
}

impl RateSnapshot {
    /// Creates a snapshot, checking that `base` is non-empty and every rate is positive
    pub fn new(
        base: impl Into<String>,
        as_of: NaiveDate,
        rates: HashMap<String, Decimal>,
    ) -> Result<Self, SnapshotError> {
        let base = base.into();
        if base.trim().is_empty() {
            return Err(SnapshotError::EmptyBase);
        }

        if let Some((code, rate)) = rates.iter().find(|(_, rate)| **rate <= Decimal::ZERO) {
            return Err(SnapshotError::NonPositiveRate {
                code: code.clone(),
                rate: *rate,
            });
        }

        Ok(Self { base, as_of, rates })
    }

    /// Currency code all rates are relative to
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Provider-assigned date of the snapshot
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Full rate table
    pub fn rates(&self) -> &HashMap<String, Decimal> {
        &self.rates
    }

    /// Looks up the multiplier for a single currency code
    pub fn rate(&self, code: &str) -> Option<Decimal> {
        self.rates.get(code).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_snapshot_creation() {
        let rates = HashMap::from([("EUR".to_string(), dec!(0.92))]);
        let snapshot = RateSnapshot::new("USD", date(2024, 3, 8), rates).unwrap();

        assert_eq!(snapshot.base(), "USD");
        assert_eq!(snapshot.as_of(), date(2024, 3, 8));
        assert_eq!(snapshot.rate("EUR"), Some(dec!(0.92)));
        assert_eq!(snapshot.rate("GBP"), None);
    }

    #[test]
    fn test_snapshot_rejects_empty_base() {
        let result = RateSnapshot::new("  ", date(2024, 3, 8), HashMap::new());
        assert_eq!(result.unwrap_err(), SnapshotError::EmptyBase);
    }

    #[test]
    fn test_snapshot_rejects_zero_rate() {
        let rates = HashMap::from([("JPY".to_string(), dec!(0))]);
        let err = RateSnapshot::new("USD", date(2024, 3, 8), rates).unwrap_err();
        assert!(matches!(err, SnapshotError::NonPositiveRate { ref code, .. } if code == "JPY"));
    }

    #[test]
    fn test_snapshot_rejects_negative_rate() {
        let rates = HashMap::from([
            ("EUR".to_string(), dec!(0.92)),
            ("GBP".to_string(), dec!(-0.79)),
        ]);
        let err = RateSnapshot::new("USD", date(2024, 3, 8), rates).unwrap_err();
        assert!(err.to_string().contains("GBP"));
    }
}
