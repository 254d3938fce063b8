//! Pulse services
//!
//! The query layer behind the market table and the message board: a keyed
//! cache with staleness and polling, optimistic mutations, the message
//! form, the SQLite message store and runtime configuration.

pub mod config;
pub mod form;
pub mod market_query;
pub mod message_store;
pub mod messages;
pub mod mutation;
pub mod poller;
pub mod query_cache;

pub use config::{ConfigError, PulseConfig, DEFAULT_SERVER_PORT};
pub use form::{FieldErrors, MessageForm, MESSAGE_REQUIRED, PHONE_NUMBER_REQUIRED};
pub use market_query::{MarketQuery, Pager, MARKET_REFETCH_INTERVAL, MARKET_STALE_TIME};
pub use message_store::{MessageStore, MessageStoreError};
pub use messages::{MessageMutation, MessageQuery, MESSAGES_REFETCH_INTERVAL, MESSAGES_STALE_TIME};
pub use mutation::{OptimisticMutation, Settlement};
pub use poller::PollHandle;
pub use query_cache::{CacheEvent, CacheEventKind, CacheStats, QueryCache, QueryFn, QueryOptions, QueryState};
