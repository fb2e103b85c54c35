//! Rate cache refresh engine
//!
//! Owns the active `RateSnapshot`, decides when it has gone stale and drives
//! the fetch-and-parse cycle that replaces it.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;
use std::time::Duration as StdDuration;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::data::fetcher::DEFAULT_TIMEOUT;
use crate::data::{parse_snapshot, FetchError, Fetcher, ParseError, RateSnapshot};

/// Hour of day (provider reference time) at which new rates are published
const PUBLISH_HOUR: i64 = 10;

/// Errors from rate lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateError {
    /// No snapshot has been loaded or fetched yet
    #[error("No exchange rates are available yet")]
    NotInitialized,

    /// The active snapshot has no rate for this code
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),
}

/// A refresh attempt failed; the previous state is untouched
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("Failed to refresh exchange rates: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to refresh exchange rates: {0}")]
    Parse(#[from] ParseError),

    #[error("Failed to refresh exchange rates: no response within {0:?}")]
    Timeout(StdDuration),
}

/// What `ensure_fresh` did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The cached snapshot was still valid; nothing was fetched
    Fresh,
    /// A new snapshot was fetched and installed
    Replaced,
}

impl RefreshOutcome {
    pub fn replaced(self) -> bool {
        self == RefreshOutcome::Replaced
    }
}

/// Computes the instant a snapshot dated `as_of` stops being fresh.
///
/// Rates publish at 10:00 each business day, so a snapshot is good until
/// 10:00 the next day, or until Monday 10:00 for a Friday snapshot. Weekend
/// dates get the plain next-day rule.
pub fn next_refresh_after(as_of: NaiveDate) -> NaiveDateTime {
    let days = if as_of.weekday() == Weekday::Fri { 3 } else { 1 };
    as_of.and_time(NaiveTime::MIN) + Duration::days(days) + Duration::hours(PUBLISH_HOUR)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CachedRates {
    snapshot: RateSnapshot,
    next_refresh_at: NaiveDateTime,
}

/// In-memory owner of the active rate snapshot
///
/// `current` and `next_refresh_at` are either both present or both absent.
/// The dirty flag is set by every replacement and cleared by the caller once
/// the state has been persisted.
#[derive(Debug, Clone)]
pub struct RateCache {
    cached: Option<CachedRates>,
    dirty: bool,
    fetch_timeout: StdDuration,
    /// Base a fetched snapshot must be quoted against; any base when unset
    base: Option<String>,
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RateCache {
    /// Creates an empty cache with no snapshot
    pub fn new() -> Self {
        Self {
            cached: None,
            dirty: false,
            fetch_timeout: DEFAULT_TIMEOUT,
            base: None,
        }
    }

    /// Sets the upper bound on a single fetch during `ensure_fresh`
    pub fn with_fetch_timeout(mut self, timeout: StdDuration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Requires fetched snapshots to be quoted against `base`
    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Rebuilds a cache from persisted state. The result is clean.
    pub(crate) fn restore(snapshot: RateSnapshot, next_refresh_at: NaiveDateTime) -> Self {
        Self {
            cached: Some(CachedRates {
                snapshot,
                next_refresh_at,
            }),
            ..Self::new()
        }
    }

    /// The active snapshot, if any
    pub fn current(&self) -> Option<&RateSnapshot> {
        self.cached.as_ref().map(|c| &c.snapshot)
    }

    /// Instant from which the active snapshot is stale
    pub fn next_refresh_at(&self) -> Option<NaiveDateTime> {
        self.cached.as_ref().map(|c| c.next_refresh_at)
    }

    /// True when there is no snapshot or `now` has reached the refresh instant
    pub fn is_stale(&self, now: NaiveDateTime) -> bool {
        match &self.cached {
            None => true,
            Some(cached) => now >= cached.next_refresh_at,
        }
    }

    /// Fetches and installs a new snapshot if the current one is stale.
    ///
    /// At most one fetch happens per call and none while the cache is fresh.
    /// On any failure the existing snapshot and refresh instant are left as
    /// they were.
    pub async fn ensure_fresh<F: Fetcher>(
        &mut self,
        now: NaiveDateTime,
        fetcher: &F,
    ) -> Result<RefreshOutcome, RefreshError> {
        if !self.is_stale(now) {
            debug!(next_refresh_at = ?self.next_refresh_at(), "Rate cache is fresh");
            return Ok(RefreshOutcome::Fresh);
        }

        debug!(has_snapshot = self.cached.is_some(), "Rate cache is stale, fetching");

        let payload = match tokio::time::timeout(self.fetch_timeout, fetcher.fetch()).await {
            Ok(result) => result?,
            Err(_) => {
                warn!(timeout = ?self.fetch_timeout, "Rate fetch timed out");
                return Err(RefreshError::Timeout(self.fetch_timeout));
            }
        };
        let snapshot = parse_snapshot(&payload)?;

        if let Some(expected) = &self.base {
            if snapshot.base() != expected {
                warn!(
                    expected = %expected,
                    found = snapshot.base(),
                    "Provider returned rates for another base"
                );
                return Err(ParseError::UnexpectedBase {
                    expected: expected.clone(),
                    found: snapshot.base().to_string(),
                }
                .into());
            }
        }

        self.replace(snapshot);
        Ok(RefreshOutcome::Replaced)
    }

    /// Installs `snapshot` as current and recomputes the refresh instant
    pub fn replace(&mut self, snapshot: RateSnapshot) {
        let next_refresh_at = next_refresh_after(snapshot.as_of());
        info!(
            base = snapshot.base(),
            as_of = %snapshot.as_of(),
            rates = snapshot.rates().len(),
            %next_refresh_at,
            "Installed new rate snapshot"
        );

        self.cached = Some(CachedRates {
            snapshot,
            next_refresh_at,
        });
        self.dirty = true;
    }

    /// Rate for `code` from the active snapshot
    pub fn get_rate(&self, code: &str) -> Result<Decimal, RateError> {
        let snapshot = self.current().ok_or(RateError::NotInitialized)?;
        snapshot
            .rate(code)
            .ok_or_else(|| RateError::UnknownCurrency(code.to_string()))
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }
}
