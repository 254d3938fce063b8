//! Runtime configuration

use pulse_coingecko::{CoinGeckoClient, COINGECKO_API_BASE};
use pulse_inbox::{InboxClient, MESSAGE_API_BASE};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::market_query::{MarketQuery, MARKET_REFETCH_INTERVAL, MARKET_STALE_TIME};
use crate::message_store::{MessageStore, MessageStoreError};
use crate::messages::{MessageQuery, MESSAGES_REFETCH_INTERVAL, MESSAGES_STALE_TIME};
use crate::query_cache::QueryOptions;

/// Port the message API listens on by default
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// Endpoints, polling policy and server settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseConfig {
    pub coingecko_base_url: String,
    pub message_api_base: String,
    pub market: QueryOptions,
    pub messages: QueryOptions,
    pub server_port: u16,
    /// SQLite file for the message store; in memory when unset
    pub message_db_path: Option<PathBuf>,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            coingecko_base_url: COINGECKO_API_BASE.to_string(),
            message_api_base: MESSAGE_API_BASE.to_string(),
            market: QueryOptions::new(MARKET_STALE_TIME, Some(MARKET_REFETCH_INTERVAL)),
            messages: QueryOptions::new(MESSAGES_STALE_TIME, Some(MESSAGES_REFETCH_INTERVAL)),
            server_port: DEFAULT_SERVER_PORT,
            message_db_path: None,
        }
    }
}

impl PulseConfig {
    /// Load configuration from environment variables
    ///
    /// Reads:
    /// - COINGECKO_API_BASE, MESSAGE_API_BASE: endpoint roots
    /// - MARKET_STALE_MS, MARKET_REFETCH_MS: market freshness and poll period
    /// - MESSAGES_STALE_MS, MESSAGES_REFETCH_MS: message list freshness and poll period
    /// - SERVER_PORT: message API port
    /// - MESSAGE_DB_PATH: SQLite file for the message store
    ///
    /// Unset variables keep their defaults. A refetch period of 0 disables polling.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("COINGECKO_API_BASE") {
            config.coingecko_base_url = parse_url("COINGECKO_API_BASE", &value)?;
        }
        if let Some(value) = lookup("MESSAGE_API_BASE") {
            config.message_api_base = parse_url("MESSAGE_API_BASE", &value)?;
        }

        if let Some(value) = lookup("MARKET_STALE_MS") {
            config.market.stale_time = parse_millis("MARKET_STALE_MS", &value)?;
        }
        if let Some(value) = lookup("MARKET_REFETCH_MS") {
            config.market.refetch_interval = parse_period("MARKET_REFETCH_MS", &value)?;
        }
        if let Some(value) = lookup("MESSAGES_STALE_MS") {
            config.messages.stale_time = parse_millis("MESSAGES_STALE_MS", &value)?;
        }
        if let Some(value) = lookup("MESSAGES_REFETCH_MS") {
            config.messages.refetch_interval = parse_period("MESSAGES_REFETCH_MS", &value)?;
        }

        if let Some(value) = lookup("SERVER_PORT") {
            config.server_port = value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                field: "SERVER_PORT".to_string(),
                value: value.clone(),
            })?;
        }
        config.message_db_path = lookup("MESSAGE_DB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// Market query against the configured CoinGecko endpoint
    pub fn market_query(&self) -> MarketQuery {
        let client = CoinGeckoClient::with_base_url(&self.coingecko_base_url);
        MarketQuery::with_options(Arc::new(client), self.market)
    }

    /// Message query against the configured message API
    pub fn message_query(&self) -> MessageQuery {
        let client = InboxClient::with_base_url(&self.message_api_base);
        MessageQuery::with_options(Arc::new(client), self.messages)
    }

    /// Open the message store (file-backed when a path is configured)
    pub fn message_store(&self) -> Result<MessageStore, MessageStoreError> {
        match &self.message_db_path {
            Some(path) => MessageStore::open(path),
            None => MessageStore::in_memory(),
        }
    }
}

fn parse_url(field: &str, value: &str) -> Result<String, ConfigError> {
    let value = value.trim();
    Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        field: field.to_string(),
        error: e.to_string(),
    })?;
    Ok(value.trim_end_matches('/').to_string())
}

fn parse_millis(field: &str, value: &str) -> Result<Duration, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| ConfigError::InvalidNumber {
            field: field.to_string(),
            value: value.to_string(),
        })
}

fn parse_period(field: &str, value: &str) -> Result<Option<Duration>, ConfigError> {
    let period = parse_millis(field, value)?;
    Ok((!period.is_zero()).then_some(period))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid number in {field}: {value}")]
    InvalidNumber { field: String, value: String },

    #[error("Invalid URL in {field}: {error}")]
    InvalidUrl { field: String, error: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PulseConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, PulseConfig::default());
        assert_eq!(config.coingecko_base_url, "https://api.coingecko.com/api/v3");
        assert_eq!(config.message_api_base, "http://localhost:3000");
        assert_eq!(config.market.stale_time, Duration::from_secs(3));
        assert_eq!(config.messages.refetch_interval, Some(Duration::from_secs(15)));
        assert_eq!(config.server_port, 3000);
        assert!(config.message_db_path.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = PulseConfig::from_lookup(lookup(&[
            ("MESSAGE_API_BASE", "http://inbox.local:8080/"),
            ("MARKET_STALE_MS", "500"),
            ("MARKET_REFETCH_MS", "0"),
            ("SERVER_PORT", "8080"),
            ("MESSAGE_DB_PATH", "data/messages.db"),
        ]))
        .unwrap();

        assert_eq!(config.message_api_base, "http://inbox.local:8080");
        assert_eq!(config.market.stale_time, Duration::from_millis(500));
        assert_eq!(config.market.refetch_interval, None);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.message_db_path, Some(PathBuf::from("data/messages.db")));
    }

    #[test]
    fn test_invalid_values() {
        let err = PulseConfig::from_lookup(lookup(&[("SERVER_PORT", "lots")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { ref field, .. } if field == "SERVER_PORT"));

        let err = PulseConfig::from_lookup(lookup(&[("COINGECKO_API_BASE", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn test_in_memory_store_by_default() {
        let store = PulseConfig::default().message_store().unwrap();
        assert_eq!(store.count().unwrap(), 0);
    }
}
