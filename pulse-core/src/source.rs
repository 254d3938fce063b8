//! Remote data source abstractions
//!
//! The API clients implement these so the query layer can be driven by
//! in-process fakes in tests.

use async_trait::async_trait;

use crate::error::PulseResult;
use crate::message::{Message, NewMessage};
use crate::price::Price;

/// Read-only source of market table pages
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Fetch one page of prices. Pages past the end return an empty list.
    async fn fetch_page(&self, page: u32) -> PulseResult<Vec<Price>>;
}

/// Source of message requests
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Fetch the full message list
    async fn list_messages(&self) -> PulseResult<Vec<Message>>;

    /// Submit a new message and return the created record
    async fn submit_message(&self, message: &NewMessage) -> PulseResult<Message>;
}
