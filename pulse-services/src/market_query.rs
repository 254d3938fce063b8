//! Market table query
//!
//! Pages of coin prices cached under `QueryKey::Market { page }`. Changing
//! page is only a key change; page bounds are not checked, so a page past
//! the end simply caches an empty list.

use async_trait::async_trait;
use pulse_core::{MarketSource, Price, PulseError, PulseResult, QueryKey};
use std::sync::Arc;
use std::time::Duration;
use tracing::instrument;

use crate::poller::PollHandle;
use crate::query_cache::{QueryCache, QueryFn, QueryOptions, QueryState};

/// Market data is fresh for three seconds
pub const MARKET_STALE_TIME: Duration = Duration::from_secs(3);

/// Market pages are refetched every three seconds
pub const MARKET_REFETCH_INTERVAL: Duration = Duration::from_secs(3);

struct MarketFetcher {
    source: Arc<dyn MarketSource>,
}

#[async_trait]
impl QueryFn<Vec<Price>> for MarketFetcher {
    async fn fetch(&self, key: &QueryKey) -> PulseResult<Vec<Price>> {
        match key {
            QueryKey::Market { page } => self.source.fetch_page(*page).await,
            other => Err(PulseError::internal(format!(
                "Market query cannot load {}",
                other
            ))),
        }
    }
}

/// Cached, polled access to market pages
#[derive(Clone)]
pub struct MarketQuery {
    cache: QueryCache<Vec<Price>>,
}

impl MarketQuery {
    /// Create a market query with the default 3s freshness and refetch timer
    pub fn new(source: Arc<dyn MarketSource>) -> Self {
        Self::with_options(
            source,
            QueryOptions::new(MARKET_STALE_TIME, Some(MARKET_REFETCH_INTERVAL)),
        )
    }

    pub fn with_options(source: Arc<dyn MarketSource>, options: QueryOptions) -> Self {
        Self {
            cache: QueryCache::new(Arc::new(MarketFetcher { source }), options),
        }
    }

    /// Underlying cache (for subscriptions and stats)
    pub fn cache(&self) -> &QueryCache<Vec<Price>> {
        &self.cache
    }

    /// Serve or fetch one page
    #[instrument(skip(self))]
    pub async fn page(&self, page: u32) -> QueryState<Vec<Price>> {
        self.cache.fetch(&QueryKey::market(page)).await
    }

    /// Current state of a page without fetching
    pub fn state(&self, page: u32) -> QueryState<Vec<Price>> {
        self.cache.state(&QueryKey::market(page)).unwrap_or_default()
    }

    /// Keep a page fresh in the background until the handle is dropped
    pub fn poll(&self, page: u32) -> PollHandle {
        self.cache.poll(QueryKey::market(page))
    }
}

/// Page selection for the market table
///
/// `next` is unbounded. `previous` does nothing on the first page, the
/// same as the disabled "Previous" control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page: u32,
}

impl Pager {
    pub fn new() -> Self {
        Self { page: 1 }
    }

    pub fn starting_at(page: u32) -> Self {
        Self { page }
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn key(&self) -> QueryKey {
        QueryKey::market(self.page)
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn next(&mut self) -> u32 {
        self.page = self.page.saturating_add(1);
        self.page
    }

    pub fn previous(&mut self) -> u32 {
        if self.has_previous() {
            self.page -= 1;
        }
        self.page
    }
}

impl Default for Pager {
    fn default() -> Self {
        Self::new()
    }
}
