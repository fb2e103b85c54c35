//! Exchange-rate provider client
//!
//! This module performs the single HTTP GET against the rates provider and
//! hands back the raw body. Decoding lives in `parser`.

use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default provider endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.exchangeratesapi.io/latest";

/// Default base currency requested from the provider
pub const DEFAULT_BASE: &str = "USD";

/// Default upper bound on a single fetch
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when talking to the provider
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("Provider responded with status {status}")]
    Status { status: reqwest::StatusCode },
}

/// Source of raw provider payloads
#[allow(async_fn_in_trait)]
pub trait Fetcher {
    /// Fetch the latest rates payload as raw bytes
    async fn fetch(&self) -> Result<Vec<u8>, FetchError>;
}

/// Where and how to fetch rates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Provider endpoint without query string
    pub endpoint: String,
    /// Base currency all rates are requested relative to
    pub base: String,
    /// Upper bound on one fetch, enforced by the cache
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            base: DEFAULT_BASE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchConfig {
    /// Full request URL including the base currency query
    pub fn url(&self) -> String {
        format!("{}?base={}", self.endpoint, self.base)
    }
}

/// Fetches rates over HTTP with reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFetcher {
    /// Create a new HttpFetcher for the given configuration
    pub fn new(config: FetchConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        let url = self.config.url();
        debug!(%url, "Fetching exchange rates");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status });
        }

        let body = response.bytes().await?;
        debug!(bytes = body.len(), "Received rates payload");
        Ok(body.to_vec())
    }
}
