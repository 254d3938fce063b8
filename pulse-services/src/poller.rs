//! Background refetch on a fixed timer
//!
//! A poll first serves or loads the key (the "mount" fetch), then refetches
//! it every `refetch_interval` until its handle is dropped. The timer does
//! not back off after failures.

use pulse_core::QueryKey;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::query_cache::QueryCache;

/// Owns a running poll; dropping it stops the timer
#[derive(Debug)]
pub struct PollHandle {
    key: QueryKey,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Key being polled
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// Whether the poll task has exited (only when no interval is configured)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        debug!("Stopping poll for {}", self.key);
        self.task.abort();
    }
}

impl<T> QueryCache<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Start polling a key. Must be called inside a tokio runtime.
    pub fn poll(&self, key: QueryKey) -> PollHandle {
        let cache = self.clone();
        let task_key = key.clone();

        let task = tokio::spawn(async move {
            cache.fetch(&task_key).await;

            let Some(period) = cache.options().refetch_interval else {
                return;
            };

            info!("Polling {} every {:?}", task_key, period);
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                debug!("Background refetch of {}", task_key);
                cache.refetch(&task_key).await;
            }
        });

        PollHandle { key, task }
    }
}

#[cfg(test)]
mod tests {
    use crate::query_cache::{QueryFn, QueryOptions};
    use async_trait::async_trait;
    use pulse_core::{PulseError, PulseResult, QueryKey};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl QueryFn<usize> for CountingFetcher {
        async fn fetch(&self, _key: &QueryKey) -> PulseResult<usize> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail {
                return Err(PulseError::network("Fetching Error"));
            }
            Ok(n)
        }
    }

    fn counting(fail: bool) -> Arc<CountingFetcher> {
        Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_refetches_on_interval() {
        let fetcher = counting(false);
        let cache: QueryCache<usize> = QueryCache::new(
            fetcher.clone(),
            QueryOptions::new(Duration::from_secs(3), Some(Duration::from_secs(3))),
        );
        let key = QueryKey::market(1);

        let handle = cache.poll(key.clone());
        tokio::time::sleep(Duration::from_millis(9_500)).await;

        // Mount fetch plus ticks at 3s, 6s and 9s
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        assert_eq!(cache.get_query_data(&key), Some(4));

        drop(handle);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_keeps_going_after_failures() {
        let fetcher = counting(true);
        let cache: QueryCache<usize> = QueryCache::new(
            fetcher.clone(),
            QueryOptions::new(Duration::from_secs(15), Some(Duration::from_secs(15))),
        );

        let _handle = cache.poll(QueryKey::Messages);
        tokio::time::sleep(Duration::from_secs(46)).await;

        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 4);
        assert!(cache.state(&QueryKey::Messages).unwrap().is_error());
    }

    /// Never finishes a fetch until released
    struct StalledFetcher {
        release: tokio::sync::Notify,
    }

    #[async_trait]
    impl QueryFn<usize> for StalledFetcher {
        async fn fetch(&self, _key: &QueryKey) -> PulseResult<usize> {
            self.release.notified().await;
            Ok(1)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_poll_mid_fetch_clears_fetching() {
        let fetcher = Arc::new(StalledFetcher {
            release: tokio::sync::Notify::new(),
        });
        let cache: QueryCache<usize> = QueryCache::new(
            fetcher,
            QueryOptions::new(Duration::from_secs(3), Some(Duration::from_secs(3))),
        );
        let key = QueryKey::market(1);

        let handle = cache.poll(key.clone());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(cache.state(&key).unwrap().is_fetching);
        assert_eq!(cache.stats().fetching, 1);

        drop(handle);
        tokio::time::sleep(Duration::from_millis(10)).await;

        let state = cache.state(&key).unwrap();
        assert!(!state.is_fetching);
        assert!(state.is_loading());
        assert_eq!(cache.stats().fetching, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_without_interval_fetches_once() {
        let fetcher = counting(false);
        let cache: QueryCache<usize> = QueryCache::new(fetcher.clone(), QueryOptions::default());

        let handle = cache.poll(QueryKey::Messages);
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert!(handle.is_finished());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }
}
