//! Query Cache
//!
//! Keyed in-memory cache of the last known payload per query key, with
//! fetch status, staleness tracking, cancellation and invalidation.
//! Consumers read state synchronously and learn about changes through a
//! broadcast of `CacheEvent`s.
//!
//! Every fetch for a key carries a generation number. Cancelling, or
//! starting a newer fetch, bumps the generation so a late result from the
//! older fetch is dropped instead of overwriting newer data.

use async_trait::async_trait;
use parking_lot::RwLock;
use pulse_core::{PulseResult, QueryKey, QueryStatus};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Capacity of the change event channel
const EVENT_CAPACITY: usize = 256;

/// Loads the data behind a query key
#[async_trait]
pub trait QueryFn<T>: Send + Sync {
    async fn fetch(&self, key: &QueryKey) -> PulseResult<T>;
}

/// Freshness and background refetch policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
    /// How long fetched data is served without asking the source again
    pub stale_time: Duration,
    /// Period of the background refetch timer, if any
    pub refetch_interval: Option<Duration>,
}

impl QueryOptions {
    pub fn new(stale_time: Duration, refetch_interval: Option<Duration>) -> Self {
        Self {
            stale_time,
            refetch_interval,
        }
    }
}

impl Default for QueryOptions {
    /// Always stale, no background refetch
    fn default() -> Self {
        Self::new(Duration::ZERO, None)
    }
}

/// Snapshot of one cache entry
#[derive(Debug, Clone, PartialEq)]
pub struct QueryState<T> {
    /// Last successful payload (kept across failed refetches)
    pub data: Option<T>,
    /// User-facing text of the last failure
    pub error: Option<String>,
    pub status: QueryStatus,
    /// A fetch is in flight (initial or background)
    pub is_fetching: bool,
    /// Marked stale explicitly, regardless of age
    pub is_invalidated: bool,
    /// When data was last written
    pub updated_at: Option<Instant>,
}

impl<T> QueryState<T> {
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// Whether the data is older than `stale_time` (or missing, or invalidated)
    pub fn is_stale(&self, stale_time: Duration) -> bool {
        if self.is_invalidated {
            return true;
        }
        match self.updated_at {
            Some(at) => at.elapsed() >= stale_time,
            None => true,
        }
    }
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self {
            data: None,
            error: None,
            status: QueryStatus::Loading,
            is_fetching: false,
            is_invalidated: false,
            updated_at: None,
        }
    }
}

/// What happened to an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// A fetch started
    FetchStarted,
    /// New data was written (fetch result or local write)
    DataChanged,
    /// A fetch succeeded with data equal to what was cached
    Refreshed,
    /// A fetch failed
    Failed,
    /// An in-flight fetch was cancelled
    Cancelled,
    /// The entry was removed
    Removed,
}

/// Change notification for one key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEvent {
    pub key: QueryKey,
    pub kind: CacheEventKind,
}

#[derive(Debug)]
struct Entry<T> {
    state: QueryState<T>,
    generation: u64,
}

impl<T> Entry<T> {
    fn new() -> Self {
        Self {
            state: QueryState::default(),
            generation: 0,
        }
    }
}

/// Keyed query cache
///
/// Cloning is cheap and every clone shares the same entries, so one cache
/// is created per session and handed to whatever needs it.
pub struct QueryCache<T> {
    entries: Arc<RwLock<HashMap<QueryKey, Entry<T>>>>,
    fetcher: Arc<dyn QueryFn<T>>,
    options: QueryOptions,
    events: broadcast::Sender<CacheEvent>,
}

impl<T> QueryCache<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create an empty cache that loads entries through `fetcher`
    pub fn new(fetcher: Arc<dyn QueryFn<T>>, options: QueryOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            fetcher,
            options,
            events,
        }
    }

    pub fn options(&self) -> QueryOptions {
        self.options
    }

    /// Subscribe to change events for every key
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.events.subscribe()
    }

    fn emit(&self, key: &QueryKey, kind: CacheEventKind) {
        // No receivers is fine
        let _ = self.events.send(CacheEvent {
            key: key.clone(),
            kind,
        });
    }

    /// Current state of a key, if it has ever been touched
    pub fn state(&self, key: &QueryKey) -> Option<QueryState<T>> {
        self.entries.read().get(key).map(|e| e.state.clone())
    }

    /// Cached payload of a key
    pub fn get_query_data(&self, key: &QueryKey) -> Option<T> {
        self.entries.read().get(key).and_then(|e| e.state.data.clone())
    }

    /// Whether a key needs to be fetched again
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries
            .read()
            .get(key)
            .map_or(true, |e| e.state.is_stale(self.options.stale_time))
    }

    /// Write data for a key directly and publish it
    pub fn set_query_data(&self, key: &QueryKey, data: T) {
        {
            let mut entries = self.entries.write();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.state.data = Some(data);
            entry.state.status = QueryStatus::Success;
            entry.state.error = None;
            entry.state.is_invalidated = false;
            entry.state.updated_at = Some(Instant::now());
        }
        debug!("Set query data for {}", key);
        self.emit(key, CacheEventKind::DataChanged);
    }

    /// Put back a previously captured state verbatim
    ///
    /// Status, error text and update time come back with the data. Only the
    /// in-flight flag is left as it currently is.
    pub fn restore(&self, key: &QueryKey, snapshot: QueryState<T>) {
        {
            let mut entries = self.entries.write();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            let is_fetching = entry.state.is_fetching;
            entry.state = QueryState {
                is_fetching,
                ..snapshot
            };
        }
        debug!("Restored query state for {}", key);
        self.emit(key, CacheEventKind::DataChanged);
    }

    /// Serve fresh cached data, or fetch it
    pub async fn fetch(&self, key: &QueryKey) -> QueryState<T> {
        if let Some(state) = self.fresh_state(key) {
            debug!("Cache hit for {}", key);
            return state;
        }
        self.refetch(key).await
    }

    fn fresh_state(&self, key: &QueryKey) -> Option<QueryState<T>> {
        let entries = self.entries.read();
        let entry = entries.get(key)?;
        let fresh =
            entry.state.data.is_some() && !entry.state.is_stale(self.options.stale_time);
        fresh.then(|| entry.state.clone())
    }

    /// Fetch a key from the source regardless of freshness
    ///
    /// Cached data stays readable while the fetch is in flight. A failure
    /// keeps the previous data and records the error text.
    pub async fn refetch(&self, key: &QueryKey) -> QueryState<T> {
        let generation = {
            let mut entries = self.entries.write();
            let entry = entries.entry(key.clone()).or_insert_with(Entry::new);
            entry.generation += 1;
            entry.state.is_fetching = true;
            entry.generation
        };
        self.emit(key, CacheEventKind::FetchStarted);

        let mut guard = FetchGuard {
            cache: self,
            key,
            generation,
            armed: true,
        };
        let result = self.fetcher.fetch(key).await;
        guard.armed = false;

        let (state, kind) = {
            let mut entries = self.entries.write();
            let Some(entry) = entries.get_mut(key) else {
                debug!("Dropping fetch result for removed key {}", key);
                return QueryState::default();
            };

            if entry.generation != generation {
                debug!("Dropping superseded fetch result for {}", key);
                return entry.state.clone();
            }

            entry.state.is_fetching = false;
            let kind = match result {
                Ok(data) => {
                    let changed = entry.state.data.as_ref() != Some(&data);
                    if changed {
                        entry.state.data = Some(data);
                    }
                    entry.state.status = QueryStatus::Success;
                    entry.state.error = None;
                    entry.state.is_invalidated = false;
                    entry.state.updated_at = Some(Instant::now());
                    if changed {
                        CacheEventKind::DataChanged
                    } else {
                        CacheEventKind::Refreshed
                    }
                }
                Err(e) => {
                    warn!("Fetch for {} failed: {}", key, e);
                    entry.state.status = QueryStatus::Error;
                    entry.state.error = Some(e.user_message().to_string());
                    CacheEventKind::Failed
                }
            };
            (entry.state.clone(), kind)
        };

        self.emit(key, kind);
        state
    }

    /// Cancel the in-flight fetch of a key; its result will be discarded
    pub fn cancel_queries(&self, key: &QueryKey) {
        let cancelled = {
            let mut entries = self.entries.write();
            match entries.get_mut(key) {
                Some(entry) if entry.state.is_fetching => {
                    entry.generation += 1;
                    entry.state.is_fetching = false;
                    true
                }
                _ => false,
            }
        };

        if cancelled {
            debug!("Cancelled in-flight fetch for {}", key);
            self.emit(key, CacheEventKind::Cancelled);
        }
    }

    /// Mark a key stale and fetch it again right away
    pub async fn invalidate_queries(&self, key: &QueryKey) -> QueryState<T> {
        {
            let mut entries = self.entries.write();
            if let Some(entry) = entries.get_mut(key) {
                entry.state.is_invalidated = true;
            }
        }
        debug!("Invalidated {}", key);
        self.refetch(key).await
    }

    /// Drop one entry
    pub fn remove_queries(&self, key: &QueryKey) {
        if self.entries.write().remove(key).is_some() {
            self.emit(key, CacheEventKind::Removed);
        }
    }

    /// Drop every entry
    pub fn clear(&self) {
        let keys: Vec<QueryKey> = self.entries.write().drain().map(|(k, _)| k).collect();
        for key in &keys {
            self.emit(key, CacheEventKind::Removed);
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.read();

        let total = entries.len();
        let fresh = entries
            .values()
            .filter(|e| !e.state.is_stale(self.options.stale_time))
            .count();
        let fetching = entries.values().filter(|e| e.state.is_fetching).count();

        CacheStats {
            total,
            fresh,
            stale: total - fresh,
            fetching,
        }
    }
}

/// Clears the in-flight flag if a fetch future is dropped before it settles
struct FetchGuard<'a, T> {
    cache: &'a QueryCache<T>,
    key: &'a QueryKey,
    generation: u64,
    armed: bool,
}

impl<T> Drop for FetchGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let aborted = {
            let mut entries = self.cache.entries.write();
            match entries.get_mut(self.key) {
                Some(entry) if entry.generation == self.generation => {
                    entry.state.is_fetching = false;
                    true
                }
                _ => false,
            }
        };

        if aborted {
            debug!("Fetch for {} dropped before completion", self.key);
            let _ = self.cache.events.send(CacheEvent {
                key: self.key.clone(),
                kind: CacheEventKind::Cancelled,
            });
        }
    }
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            fetcher: Arc::clone(&self.fetcher),
            options: self.options,
            events: self.events.clone(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub stale: usize,
    pub fetching: usize,
}
