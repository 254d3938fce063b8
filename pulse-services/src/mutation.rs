//! Optimistic mutations over a cached query
//!
//! A mutation runs in two phases:
//!
//! 1. **Begin**: cancel any in-flight fetch of the key, snapshot the cached
//!    entry, then write the speculative value so readers see it at once.
//! 2. **Settle**: the write's outcome becomes a [`Settlement`] and is
//!    handled in one place. Success invalidates the key so the canonical
//!    value is fetched; failure restores the snapshot, status included.

use pulse_core::{PulseError, PulseResult, QueryKey};
use std::future::Future;
use tracing::{debug, info, warn};

use crate::query_cache::{QueryCache, QueryState};

/// Outcome of a remote write
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement<R> {
    Success(R),
    Failure(PulseError),
}

impl<R> Settlement<R> {
    pub fn is_success(&self) -> bool {
        matches!(self, Settlement::Success(_))
    }

    pub fn error(&self) -> Option<&PulseError> {
        match self {
            Settlement::Success(_) => None,
            Settlement::Failure(e) => Some(e),
        }
    }

    pub fn into_result(self) -> PulseResult<R> {
        match self {
            Settlement::Success(value) => Ok(value),
            Settlement::Failure(e) => Err(e),
        }
    }
}

impl<R> From<PulseResult<R>> for Settlement<R> {
    fn from(result: PulseResult<R>) -> Self {
        match result {
            Ok(value) => Settlement::Success(value),
            Err(e) => Settlement::Failure(e),
        }
    }
}

/// Optimistic write against one cache key
pub struct OptimisticMutation<T> {
    cache: QueryCache<T>,
    key: QueryKey,
}

impl<T> OptimisticMutation<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(cache: QueryCache<T>, key: QueryKey) -> Self {
        Self { cache, key }
    }

    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Cancel, snapshot and apply the speculative value
    ///
    /// Returns the entry to restore on failure. When nothing is cached
    /// there is nothing to extend, so no speculative value is written.
    pub fn begin(&self, apply: impl FnOnce(&T) -> T) -> Option<QueryState<T>> {
        self.cache.cancel_queries(&self.key);

        let snapshot = self
            .cache
            .state(&self.key)
            .filter(|state| state.data.is_some());
        match snapshot.as_ref().and_then(|state| state.data.as_ref()) {
            Some(previous) => {
                self.cache.set_query_data(&self.key, apply(previous));
                debug!("Applied optimistic update to {}", self.key);
            }
            None => debug!("Nothing cached for {}, skipping optimistic update", self.key),
        }
        snapshot
    }

    /// Reconcile the cache with the outcome of the write
    pub async fn settle<R>(&self, settlement: &Settlement<R>, snapshot: Option<QueryState<T>>) {
        if let Settlement::Failure(e) = settlement {
            warn!("Mutation on {} failed: {}", self.key, e);
            if let Some(previous) = snapshot {
                self.cache.restore(&self.key, previous);
                info!("Rolled back {} to its snapshot", self.key);
            }
            return;
        }

        info!("Mutation on {} succeeded, refetching", self.key);
        self.cache.invalidate_queries(&self.key).await;
    }

    /// Begin, perform `write`, then settle
    pub async fn run<R, F>(&self, apply: impl FnOnce(&T) -> T, write: F) -> Settlement<R>
    where
        F: Future<Output = PulseResult<R>>,
    {
        let snapshot = self.begin(apply);
        let settlement = Settlement::from(write.await);
        self.settle(&settlement, snapshot).await;
        settlement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query_cache::{QueryFn, QueryOptions};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct ServerList {
        calls: AtomicUsize,
        down: parking_lot::Mutex<bool>,
    }

    #[async_trait]
    impl QueryFn<Vec<&'static str>> for ServerList {
        async fn fetch(&self, _key: &QueryKey) -> PulseResult<Vec<&'static str>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if *self.down.lock() {
                return Err(PulseError::network("Fetching Error"));
            }
            Ok(vec!["a", "b", "c"])
        }
    }

    fn setup() -> (Arc<ServerList>, OptimisticMutation<Vec<&'static str>>, QueryCache<Vec<&'static str>>) {
        let server = Arc::new(ServerList {
            calls: AtomicUsize::new(0),
            down: parking_lot::Mutex::new(false),
        });
        let cache: QueryCache<Vec<&'static str>> =
            QueryCache::new(server.clone(), QueryOptions::default());
        cache.set_query_data(&QueryKey::Messages, vec!["a", "b"]);
        let mutation = OptimisticMutation::new(cache.clone(), QueryKey::Messages);
        (server, mutation, cache)
    }

    fn append_c(list: &Vec<&'static str>) -> Vec<&'static str> {
        let mut next = list.clone();
        next.push("c");
        next
    }

    #[tokio::test]
    async fn test_failure_restores_snapshot() {
        let (server, mutation, cache) = setup();

        let settlement: Settlement<()> = mutation
            .run(append_c, async { Err(PulseError::api("An error has occurred")) })
            .await;

        assert!(!settlement.is_success());
        assert_eq!(cache.get_query_data(&QueryKey::Messages), Some(vec!["a", "b"]));
        assert_eq!(server.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_refetches() {
        let (server, mutation, cache) = setup();

        let settlement = mutation.run(append_c, async { Ok(7) }).await;

        assert_eq!(settlement, Settlement::Success(7));
        assert_eq!(server.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.get_query_data(&QueryKey::Messages), Some(vec!["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_begin_applies_speculative_value() {
        let (_server, mutation, cache) = setup();

        let snapshot = mutation.begin(append_c);

        assert_eq!(snapshot.and_then(|s| s.data), Some(vec!["a", "b"]));
        assert_eq!(cache.get_query_data(&QueryKey::Messages), Some(vec!["a", "b", "c"]));
    }

    #[tokio::test]
    async fn test_failure_restores_entry_status() {
        let (server, mutation, cache) = setup();
        *server.down.lock() = true;
        cache.refetch(&QueryKey::Messages).await;
        let before = cache.state(&QueryKey::Messages).unwrap();
        assert!(before.is_error());

        let settlement: Settlement<()> = mutation
            .run(append_c, async { Err(PulseError::api("An error has occurred")) })
            .await;

        assert!(!settlement.is_success());
        assert_eq!(cache.state(&QueryKey::Messages), Some(before));
    }

    #[test]
    fn test_settlement_from_result() {
        let ok: Settlement<u8> = Ok(1).into();
        assert!(ok.is_success());
        assert_eq!(ok.into_result(), Ok(1));

        let failed: Settlement<u8> = Err(PulseError::network("down")).into();
        assert_eq!(failed.error(), Some(&PulseError::network("down")));
    }
}
