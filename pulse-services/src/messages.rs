//! Message list query and the optimistic submit flow

use async_trait::async_trait;
use chrono::Utc;
use pulse_core::{Message, MessageSource, NewMessage, PulseError, PulseResult, QueryKey};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

use crate::form::MessageForm;
use crate::mutation::{OptimisticMutation, Settlement};
use crate::poller::PollHandle;
use crate::query_cache::{QueryCache, QueryFn, QueryOptions, QueryState};

/// The message list is fresh for fifteen seconds
pub const MESSAGES_STALE_TIME: Duration = Duration::from_secs(15);

/// The message list is refetched every fifteen seconds
pub const MESSAGES_REFETCH_INTERVAL: Duration = Duration::from_secs(15);

struct MessageFetcher {
    source: Arc<dyn MessageSource>,
}

#[async_trait]
impl QueryFn<Vec<Message>> for MessageFetcher {
    async fn fetch(&self, key: &QueryKey) -> PulseResult<Vec<Message>> {
        match key {
            QueryKey::Messages => self.source.list_messages().await,
            other => Err(PulseError::internal(format!(
                "Message query cannot load {}",
                other
            ))),
        }
    }
}

/// Cached, polled access to the message list
#[derive(Clone)]
pub struct MessageQuery {
    cache: QueryCache<Vec<Message>>,
    source: Arc<dyn MessageSource>,
}

impl MessageQuery {
    /// Create a message query with the default 15s freshness and refetch timer
    pub fn new(source: Arc<dyn MessageSource>) -> Self {
        Self::with_options(
            source,
            QueryOptions::new(MESSAGES_STALE_TIME, Some(MESSAGES_REFETCH_INTERVAL)),
        )
    }

    pub fn with_options(source: Arc<dyn MessageSource>, options: QueryOptions) -> Self {
        let fetcher = Arc::new(MessageFetcher {
            source: Arc::clone(&source),
        });
        Self {
            cache: QueryCache::new(fetcher, options),
            source,
        }
    }

    /// Underlying cache (for subscriptions and stats)
    pub fn cache(&self) -> &QueryCache<Vec<Message>> {
        &self.cache
    }

    /// Serve or fetch the list
    pub async fn list(&self) -> QueryState<Vec<Message>> {
        self.cache.fetch(&QueryKey::Messages).await
    }

    /// Current state of the list without fetching
    pub fn state(&self) -> QueryState<Vec<Message>> {
        self.cache.state(&QueryKey::Messages).unwrap_or_default()
    }

    /// Rows to display
    ///
    /// A failed refetch leaves the last loaded list in place with no
    /// indicator.
    pub fn messages(&self) -> Vec<Message> {
        self.cache
            .get_query_data(&QueryKey::Messages)
            .unwrap_or_default()
    }

    /// Keep the list fresh in the background until the handle is dropped
    pub fn poll(&self) -> PollHandle {
        self.cache.poll(QueryKey::Messages)
    }

    /// Submit flow bound to this list
    pub fn mutation(&self) -> MessageMutation {
        MessageMutation {
            source: Arc::clone(&self.source),
            mutation: OptimisticMutation::new(self.cache.clone(), QueryKey::Messages),
        }
    }
}

/// Submits messages with an optimistic pending row
pub struct MessageMutation {
    source: Arc<dyn MessageSource>,
    mutation: OptimisticMutation<Vec<Message>>,
}

impl MessageMutation {
    /// Submit a message
    ///
    /// The pending row is visible in the cached list before the server
    /// answers. Success refetches the list; failure restores the list as it
    /// was before the call.
    #[instrument(skip(self, new), fields(phone_number = %new.phone_number))]
    pub async fn submit(&self, new: NewMessage) -> Settlement<Message> {
        let pending = Message::pending(new.clone(), Utc::now());

        let settlement = self
            .mutation
            .run(
                move |previous: &Vec<Message>| {
                    let mut next = previous.clone();
                    next.push(pending);
                    next
                },
                self.source.submit_message(&new),
            )
            .await;

        if let Settlement::Success(created) = &settlement {
            info!("Message {:?} accepted", created.id);
        }
        settlement
    }

    /// Validate the form, submit it and reflect the outcome on the form
    ///
    /// Returns `None` when validation fails; nothing is sent in that case.
    pub async fn send(&self, form: &mut MessageForm) -> Option<Settlement<Message>> {
        let new = form.validate()?;
        let settlement = self.submit(new).await;
        form.settle(&settlement);
        Some(settlement)
    }
}
