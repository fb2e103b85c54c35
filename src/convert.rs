//! Currency conversion against the cached rates
//!
//! `Converter` is the single entry point the text prompt and the one-shot
//! command line mode use: it validates input, looks up the rate and rounds
//! the result for display.

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use crate::cache::{RateCache, RateError};
use crate::currency::{Currency, CurrencyDirectory};
use crate::data::parser::parse_decimal;

/// Decimal places in a converted amount
const RESULT_SCALE: u32 = 2;

/// Errors caused by conversion input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Amount is not a number, is negative, or is too large to convert
    #[error("Invalid amount: '{0}'")]
    InvalidAmount(String),

    /// Currency is not in the directory or has no rate in the snapshot
    #[error("Unknown currency: '{0}'")]
    UnknownCurrency(String),

    /// No rates have been loaded yet
    #[error("No exchange rates are available yet")]
    NotInitialized,
}

impl From<RateError> for ConversionError {
    fn from(err: RateError) -> Self {
        match err {
            RateError::NotInitialized => ConversionError::NotInitialized,
            RateError::UnknownCurrency(code) => ConversionError::UnknownCurrency(code),
        }
    }
}

/// Parses a user-supplied amount
///
/// Accepts plain or exponent decimal notation with surrounding whitespace.
/// Rejects anything unparsable and negative values.
pub fn parse_amount(input: &str) -> Result<Decimal, ConversionError> {
    let trimmed = input.trim();
    let amount =
        parse_decimal(trimmed).ok_or_else(|| ConversionError::InvalidAmount(trimmed.to_string()))?;

    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(ConversionError::InvalidAmount(trimmed.to_string()));
    }

    Ok(amount)
}

/// Rounds to two decimals, ties away from zero, always showing two digits
pub fn round_result(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(RESULT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(RESULT_SCALE);
    rounded
}

/// Converts amounts out of the cache's base currency
#[derive(Debug, Clone, Copy)]
pub struct Converter<'a> {
    cache: &'a RateCache,
    directory: &'a CurrencyDirectory,
}

impl<'a> Converter<'a> {
    pub fn new(cache: &'a RateCache, directory: &'a CurrencyDirectory) -> Self {
        Self { cache, directory }
    }

    /// Currencies available for selection, in presentation order
    pub fn list_currencies(&self) -> &'static [Currency] {
        self.directory.all()
    }

    /// Directory entry for the snapshot's base currency, if listed
    pub fn base_currency(&self) -> Option<&'static Currency> {
        self.cache
            .current()
            .and_then(|snapshot| self.directory.by_code(snapshot.base()))
    }

    /// Converts `amount` of the base currency into `code`
    ///
    /// The product is rounded to exactly two decimals with ties going away
    /// from zero.
    pub fn convert(&self, amount: Decimal, code: &str) -> Result<Decimal, ConversionError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(ConversionError::InvalidAmount(amount.to_string()));
        }
        if self.directory.by_code(code).is_none() {
            return Err(ConversionError::UnknownCurrency(code.to_string()));
        }

        let rate = self.cache.get_rate(code)?;
        let product = amount
            .checked_mul(rate)
            .ok_or_else(|| ConversionError::InvalidAmount(amount.to_string()))?;

        Ok(round_result(product))
    }

    /// Validates raw input and converts in one step
    ///
    /// `currency` is matched against the directory by name or code. This is
    /// the command both front ends drive.
    pub fn submit(&self, amount: &str, currency: &str) -> Result<Decimal, ConversionError> {
        let amount = parse_amount(amount)?;
        let entry = self
            .directory
            .find(currency)
            .ok_or_else(|| ConversionError::UnknownCurrency(currency.trim().to_string()))?;
        self.convert(amount, entry.code)
    }
}
