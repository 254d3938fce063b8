//! Message API client
//!
//! Talks to the local `/api/message` endpoint: list all requests and
//! submit a new one.

use async_trait::async_trait;
use pulse_core::{Message, MessageSource, NewMessage, PulseError, PulseResult};
use reqwest::Client;
use tracing::{debug, info, instrument, warn};

/// Base URL of the message API when running locally
pub const MESSAGE_API_BASE: &str = "http://localhost:3000";

/// Text surfaced when a submission fails
pub const SUBMIT_ERROR: &str = "An error has occurred";

/// Text surfaced when the list cannot be loaded
pub const LIST_ERROR: &str = "Fetching Error";

/// Message API client
#[derive(Clone)]
pub struct InboxClient {
    client: Client,
    base_url: String,
}

impl InboxClient {
    /// Create a client against the local message API
    pub fn new() -> Self {
        Self::with_base_url(MESSAGE_API_BASE)
    }

    /// Create a client against another host
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

    /// URL of the message collection
    pub fn messages_url(&self) -> String {
        format!("{}/api/message", self.base_url)
    }

    /// Fetch every message request
    #[instrument(skip(self))]
    pub async fn messages(&self) -> PulseResult<Vec<Message>> {
        let url = self.messages_url();
        debug!("Fetching messages from: {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            warn!("Failed to reach message API: {}", e);
            PulseError::network(LIST_ERROR)
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Message API error ({}): {}", status, body);
            return Err(PulseError::api(LIST_ERROR));
        }

        response.json().await.map_err(|e| {
            warn!("Failed to parse message list: {}", e);
            PulseError::parse(LIST_ERROR)
        })
    }

    /// Submit a new message request
    #[instrument(skip(self, message), fields(phone_number = %message.phone_number))]
    pub async fn submit(&self, message: &NewMessage) -> PulseResult<Message> {
        let url = self.messages_url();
        info!("Submitting message to: {}", url);

        let response = self
            .client
            .post(&url)
            .json(message)
            .send()
            .await
            .map_err(|e| {
                warn!("Failed to reach message API: {}", e);
                PulseError::network(SUBMIT_ERROR)
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!("Message submission rejected ({}): {}", status, body);
            return Err(PulseError::api(SUBMIT_ERROR));
        }

        let created: Message = response.json().await.map_err(|e| {
            warn!("Failed to parse created message: {}", e);
            PulseError::parse(SUBMIT_ERROR)
        })?;

        debug!("Message created with id {:?}", created.id);
        Ok(created)
    }
}

impl Default for InboxClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageSource for InboxClient {
    async fn list_messages(&self) -> PulseResult<Vec<Message>> {
        self.messages().await
    }

    async fn submit_message(&self, message: &NewMessage) -> PulseResult<Message> {
        self.submit(message).await
    }
}
