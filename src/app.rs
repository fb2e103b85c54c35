//! Application lifecycle for the converter
//!
//! Restores the saved cache, refreshes it when stale, persists a replacement
//! and then hands out a `Converter` for the remainder of the run.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::cache::{RateCache, RateStore, RefreshError, RefreshOutcome};
use crate::convert::Converter;
use crate::currency::CurrencyDirectory;
use crate::data::{FetchConfig, Fetcher};

/// Result of bringing the cache up to date at startup
#[derive(Debug)]
pub enum StartupStatus {
    /// Rates are current (either already fresh or just replaced)
    Ready(RefreshOutcome),
    /// The refresh failed but an older snapshot is still being served
    Stale(RefreshError),
}

/// Main application struct owning the cache for one run
pub struct App<F> {
    cache: RateCache,
    store: Option<RateStore>,
    fetcher: F,
    directory: CurrencyDirectory,
}

impl<F: Fetcher> App<F> {
    /// Builds the app, restoring any saved state from `store`
    ///
    /// A missing, corrupt or incompatible state file simply yields an empty
    /// cache, as does one saved for a base other than `fetch.base`.
    pub fn new(
        store: Option<RateStore>,
        fetcher: F,
        directory: CurrencyDirectory,
        fetch: &FetchConfig,
    ) -> Self {
        let cache = store
            .as_ref()
            .and_then(|store| store.load(&fetch.base))
            .unwrap_or_default()
            .with_fetch_timeout(fetch.timeout)
            .with_base(fetch.base.clone());

        Self {
            cache,
            store,
            fetcher,
            directory,
        }
    }

    /// Makes sure there are usable rates, fetching and saving as needed
    ///
    /// Returns an error only when the refresh failed and there is no earlier
    /// snapshot to fall back on.
    pub async fn startup(&mut self, now: NaiveDateTime) -> Result<StartupStatus, RefreshError> {
        match self.cache.ensure_fresh(now, &self.fetcher).await {
            Ok(outcome) => {
                if outcome.replaced() {
                    self.persist();
                }
                Ok(StartupStatus::Ready(outcome))
            }
            Err(e) if self.cache.current().is_some() => {
                warn!(error = %e, "Serving stale exchange rates");
                Ok(StartupStatus::Stale(e))
            }
            Err(e) => Err(e),
        }
    }

    /// Saves the cache if it has unsaved changes
    ///
    /// A failed save is logged and otherwise ignored; the in-memory cache
    /// keeps serving conversions.
    pub fn persist(&mut self) {
        if !self.cache.is_dirty() {
            return;
        }
        let Some(store) = &self.store else {
            return;
        };

        match store.save(&self.cache) {
            Ok(()) => {
                info!(path = %store.path().display(), "Saved exchange rates");
                self.cache.clear_dirty();
            }
            Err(e) => warn!(error = %e, "Failed to save exchange rates"),
        }
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    pub fn directory(&self) -> &CurrencyDirectory {
        &self.directory
    }

    /// Converter bound to the current cache
    pub fn converter(&self) -> Converter<'_> {
        Converter::new(&self.cache, &self.directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{FetchError, ParseError};
    use chrono::NaiveDate;
    use std::cell::Cell;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const FRIDAY_PAYLOAD: &str =
        r#"{"base":"USD","date":"2024-03-08","rates":{"EUR":0.92,"GBP":0.7816}}"#;

    const EUR_PAYLOAD: &str = r#"{"base":"EUR","date":"2024-03-08","rates":{"USD":1.087}}"#;

    struct MockFetcher {
        body: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl MockFetcher {
        fn ok(body: &'static str) -> Self {
            Self {
                body: Some(body),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                body: None,
                calls: Cell::new(0),
            }
        }
    }

    impl Fetcher for MockFetcher {
        async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
            self.calls.set(self.calls.get() + 1);
            match self.body {
                Some(body) => Ok(body.as_bytes().to_vec()),
                None => Err(FetchError::Status {
                    status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                }),
            }
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn fetch_config(base: &str) -> FetchConfig {
        FetchConfig {
            base: base.to_string(),
            timeout: Duration::from_secs(5),
            ..FetchConfig::default()
        }
    }

    fn app_in(dir: &TempDir, fetcher: MockFetcher) -> App<MockFetcher> {
        App::new(
            Some(RateStore::with_dir(dir.path().to_path_buf())),
            fetcher,
            CurrencyDirectory::new(),
            &fetch_config("USD"),
        )
    }

    #[tokio::test]
    async fn test_first_run_fetches_and_saves() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir, MockFetcher::ok(FRIDAY_PAYLOAD));

        let status = app.startup(at(2024, 3, 8, 18)).await.unwrap();

        assert!(matches!(status, StartupStatus::Ready(RefreshOutcome::Replaced)));
        assert_eq!(app.fetcher.calls.get(), 1);
        assert!(!app.cache().is_dirty());
        assert!(dir.path().join("rates.json").exists());
        assert_eq!(
            app.converter().submit("100", "Euro").unwrap().to_string(),
            "92.00"
        );
    }

    #[tokio::test]
    async fn test_second_run_uses_saved_rates_without_fetching() {
        let dir = TempDir::new().unwrap();
        let mut first = app_in(&dir, MockFetcher::ok(FRIDAY_PAYLOAD));
        first.startup(at(2024, 3, 8, 18)).await.unwrap();

        // Sunday: still covered by Friday's snapshot
        let mut second = app_in(&dir, MockFetcher::failing());
        let status = second.startup(at(2024, 3, 10, 12)).await.unwrap();

        assert!(matches!(status, StartupStatus::Ready(RefreshOutcome::Fresh)));
        assert_eq!(second.fetcher.calls.get(), 0);
        assert_eq!(
            second.cache().next_refresh_at(),
            Some(at(2024, 3, 11, 10))
        );
    }

    #[tokio::test]
    async fn test_failed_refresh_serves_stale_rates() {
        let dir = TempDir::new().unwrap();
        let mut first = app_in(&dir, MockFetcher::ok(FRIDAY_PAYLOAD));
        first.startup(at(2024, 3, 8, 18)).await.unwrap();
        let saved = fs::read(dir.path().join("rates.json")).unwrap();

        let mut second = app_in(&dir, MockFetcher::failing());
        let status = second.startup(at(2024, 3, 12, 12)).await.unwrap();

        assert!(matches!(status, StartupStatus::Stale(RefreshError::Fetch(_))));
        assert_eq!(second.fetcher.calls.get(), 1);
        assert_eq!(
            second.converter().submit("100", "EUR").unwrap().to_string(),
            "92.00"
        );
        assert_eq!(fs::read(dir.path().join("rates.json")).unwrap(), saved);
    }

    #[tokio::test]
    async fn test_failed_refresh_without_rates_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut app = app_in(&dir, MockFetcher::failing());

        let result = app.startup(at(2024, 3, 8, 18)).await;

        assert!(result.is_err());
        assert!(!dir.path().join("rates.json").exists());
    }

    #[tokio::test]
    async fn test_corrupt_state_starts_fresh() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rates.json"), "{ not json").unwrap();

        let mut app = app_in(&dir, MockFetcher::ok(FRIDAY_PAYLOAD));
        assert!(app.cache().current().is_none());

        app.startup(at(2024, 3, 8, 18)).await.unwrap();
        assert_eq!(app.fetcher.calls.get(), 1);
        assert!(app.cache().current().is_some());
    }

    #[tokio::test]
    async fn test_saved_rates_for_other_base_are_not_served() {
        let dir = TempDir::new().unwrap();
        let mut first = app_in(&dir, MockFetcher::ok(FRIDAY_PAYLOAD));
        first.startup(at(2024, 3, 8, 18)).await.unwrap();

        // Same day, still fresh for USD, but the run asks for EUR rates
        let mut second = App::new(
            Some(RateStore::with_dir(dir.path().to_path_buf())),
            MockFetcher::ok(EUR_PAYLOAD),
            CurrencyDirectory::new(),
            &fetch_config("EUR"),
        );
        assert!(second.cache().current().is_none());

        let status = second.startup(at(2024, 3, 8, 19)).await.unwrap();

        assert!(matches!(status, StartupStatus::Ready(RefreshOutcome::Replaced)));
        assert_eq!(second.fetcher.calls.get(), 1);
        assert_eq!(second.converter().base_currency().unwrap().name, "Euro");
        assert_eq!(
            second.converter().submit("100", "USD").unwrap().to_string(),
            "108.70"
        );
    }

    #[tokio::test]
    async fn test_fetched_rates_for_other_base_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut app = App::new(
            Some(RateStore::with_dir(dir.path().to_path_buf())),
            MockFetcher::ok(FRIDAY_PAYLOAD),
            CurrencyDirectory::new(),
            &fetch_config("EUR"),
        );

        let result = app.startup(at(2024, 3, 8, 18)).await;

        assert!(matches!(
            result,
            Err(RefreshError::Parse(ParseError::UnexpectedBase { .. }))
        ));
        assert!(app.cache().current().is_none());
        assert!(!dir.path().join("rates.json").exists());
    }

    #[tokio::test]
    async fn test_save_failure_keeps_serving() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "file").unwrap();
        let mut app = App::new(
            Some(RateStore::with_dir(blocker.join("state"))),
            MockFetcher::ok(FRIDAY_PAYLOAD),
            CurrencyDirectory::new(),
            &fetch_config("USD"),
        );

        let status = app.startup(at(2024, 3, 8, 18)).await.unwrap();

        assert!(matches!(status, StartupStatus::Ready(RefreshOutcome::Replaced)));
        assert!(app.cache().is_dirty(), "Unsaved state stays dirty");
        assert!(app.converter().submit("1", "GBP").is_ok());
    }

    #[tokio::test]
    async fn test_without_store_still_converts() {
        let mut app = App::new(
            None,
            MockFetcher::ok(FRIDAY_PAYLOAD),
            CurrencyDirectory::new(),
            &fetch_config("USD"),
        );

        app.startup(at(2024, 3, 8, 18)).await.unwrap();
        assert_eq!(
            app.converter().submit("10", "GBP").unwrap().to_string(),
            "7.82"
        );
    }
}
