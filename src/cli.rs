//! Command-line interface parsing for fxconv
//!
//! This module handles parsing of CLI arguments using clap and turns them
//! into a validated `StartupConfig`. Amount and currency arguments are
//! checked here so bad input fails before any network access.

use clap::Parser;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::convert::parse_amount;
use crate::currency::{Currency, CurrencyDirectory};
use crate::data::fetcher::{FetchConfig, DEFAULT_BASE, DEFAULT_ENDPOINT};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The amount is not a non-negative decimal number
    #[error("Invalid amount: '{0}'. Expected a non-negative decimal number")]
    InvalidAmount(String),

    /// The currency is neither a known name nor a known code
    #[error("Unknown currency: '{0}'. Run with --list to see supported currencies")]
    UnknownCurrency(String),

    /// `--amount` and `--currency` must be given together
    #[error("--amount and --currency must be used together")]
    IncompleteConversion,

    /// The base currency is not a three-letter code
    #[error("Invalid base currency: '{0}'")]
    InvalidBase(String),
}

/// fxconv - convert amounts using daily exchange rates cached between runs
#[derive(Parser, Debug)]
#[command(name = "fxconv")]
#[command(about = "Currency conversion with locally cached daily exchange rates")]
#[command(version)]
pub struct Cli {
    /// Amount of the base currency to convert (non-interactive)
    #[arg(long, value_name = "AMOUNT", allow_hyphen_values = true)]
    pub amount: Option<String>,

    /// Currency to convert to, by name ("Euro") or code ("EUR")
    #[arg(long, value_name = "CURRENCY")]
    pub currency: Option<String>,

    /// Print the supported currencies and exit
    #[arg(long)]
    pub list: bool,

    /// Directory for the saved exchange rates
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Rates provider endpoint
    #[arg(long, value_name = "URL", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Base currency to request rates for
    #[arg(long, value_name = "CODE", default_value = DEFAULT_BASE)]
    pub base: String,

    /// Seconds to wait for the rates provider
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub timeout: u64,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// What the program does after startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Text prompt session
    Interactive,
    /// Single conversion from arguments
    Convert {
        amount: Decimal,
        currency: &'static Currency,
    },
    /// Print the currency directory
    List,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub mode: Mode,
    pub fetch: FetchConfig,
    /// Overrides the default state directory
    pub cache_dir: Option<PathBuf>,
    /// Debug logging unless `RUST_LOG` says otherwise
    pub verbose: bool,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            mode: Mode::Interactive,
            fetch: FetchConfig::default(),
            cache_dir: None,
            verbose: false,
        }
    }
}

/// Parses a currency argument against the directory
pub fn parse_currency_arg(
    directory: &CurrencyDirectory,
    s: &str,
) -> Result<&'static Currency, CliError> {
    directory
        .find(s)
        .ok_or_else(|| CliError::UnknownCurrency(s.to_string()))
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with appropriate settings
    /// * `Err(CliError)` if the arguments are inconsistent or invalid
    pub fn from_cli(cli: &Cli, directory: &CurrencyDirectory) -> Result<Self, CliError> {
        let base = cli.base.trim().to_ascii_uppercase();
        if base.len() != 3 || !base.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CliError::InvalidBase(cli.base.clone()));
        }

        let mode = if cli.list {
            Mode::List
        } else {
            match (&cli.amount, &cli.currency) {
                (None, None) => Mode::Interactive,
                (Some(amount), Some(currency)) => {
                    let amount = parse_amount(amount)
                        .map_err(|_| CliError::InvalidAmount(amount.clone()))?;
                    let currency = parse_currency_arg(directory, currency)?;
                    Mode::Convert { amount, currency }
                }
                _ => return Err(CliError::IncompleteConversion),
            }
        };

        Ok(StartupConfig {
            mode,
            fetch: FetchConfig {
                endpoint: cli.endpoint.clone(),
                base,
                timeout: Duration::from_secs(cli.timeout),
            },
            cache_dir: cli.cache_dir.clone(),
            verbose: cli.verbose,
        })
    }
}
