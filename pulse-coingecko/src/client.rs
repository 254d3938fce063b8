//! CoinGecko API client
//!
//! Fetches paginated market rows from the public `/coins/markets` endpoint.

use crate::types::{MarketsQuery, COINGECKO_API_BASE};
use async_trait::async_trait;
use pulse_core::{MarketSource, Price, PulseError, PulseResult};
use reqwest::{Client, Request};
use tracing::{debug, instrument, warn};

/// Text surfaced for every market fetch failure
pub const FETCH_ERROR: &str = "Fetching Error";

/// CoinGecko API client
#[derive(Clone)]
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
}

impl CoinGeckoClient {
    /// Create a client against the public API
    pub fn new() -> Self {
        Self::with_base_url(COINGECKO_API_BASE)
    }

    /// Create a client against another deployment (proxy, mock server)
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the request for one market page
    pub fn markets_request(&self, page: u32) -> PulseResult<Request> {
        self.client
            .get(format!("{}/coins/markets", self.base_url))
            .query(&MarketsQuery::page(page))
            .build()
            .map_err(|e| PulseError::internal(format!("Failed to build markets request: {}", e)))
    }

    /// List one page of coin markets
    #[instrument(skip(self))]
    pub async fn list_markets(&self, page: u32) -> PulseResult<Vec<Price>> {
        let request = self.markets_request(page)?;

        debug!("Fetching CoinGecko markets from: {}", request.url());

        let response = self.client.execute(request).await.map_err(|e| {
            warn!("Failed to reach CoinGecko: {}", e);
            PulseError::network(FETCH_ERROR)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("CoinGecko API error ({}): {}", status, body);
            return Err(PulseError::api(FETCH_ERROR));
        }

        let prices: Vec<Price> = response.json().await.map_err(|e| {
            warn!("Failed to parse markets response: {}", e);
            PulseError::parse(FETCH_ERROR)
        })?;

        debug!("Got {} markets for page {}", prices.len(), page);
        Ok(prices)
    }
}

impl Default for CoinGeckoClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MarketSource for CoinGeckoClient {
    async fn fetch_page(&self, page: u32) -> PulseResult<Vec<Price>> {
        self.list_markets(page).await
    }
}
