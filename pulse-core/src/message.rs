//! Message requests submitted through the board

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Delivery status of a message request
///
/// Assigned by the server. Anything the client does not recognise,
/// including a missing value, is treated as still pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl MessageStatus {
    /// Map a raw wire value onto a status
    pub fn from_wire(value: Option<&str>) -> Self {
        match value {
            Some("success") => MessageStatus::Success,
            Some("failed") => MessageStatus::Failed,
            _ => MessageStatus::Pending,
        }
    }

    /// Value stored and sent on the wire
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "pending",
            MessageStatus::Success => "success",
            MessageStatus::Failed => "failed",
        }
    }

    /// Badge label shown in the status table
    pub fn label(&self) -> &'static str {
        match self {
            MessageStatus::Pending => "waiting",
            MessageStatus::Success => "success",
            MessageStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for MessageStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(MessageStatus::Pending),
            "success" => Ok(MessageStatus::Success),
            "failed" => Ok(MessageStatus::Failed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for MessageStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
        Ok(MessageStatus::from_wire(raw.as_ref().and_then(|v| v.as_str())))
    }
}

/// A message request as listed by the message API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Server-assigned identifier (absent on optimistic entries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    /// When the request was created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Recipient phone number, kept verbatim
    #[serde(deserialize_with = "phone_number")]
    pub phone_number: String,

    /// Free-text body
    pub message: String,

    #[serde(default)]
    pub status: MessageStatus,
}

impl Message {
    /// Build the local entry shown while a submission is in flight
    pub fn pending(new: NewMessage, submitted_at: DateTime<Utc>) -> Self {
        Self {
            id: None,
            created_at: Some(submitted_at),
            phone_number: new.phone_number,
            message: new.message,
            status: MessageStatus::Pending,
        }
    }
}

/// Body of a message submission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMessage {
    #[serde(deserialize_with = "phone_number")]
    pub phone_number: String,
    pub message: String,
}

impl NewMessage {
    pub fn new(phone_number: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            message: message.into(),
        }
    }
}

/// Phone numbers arrive as strings from forms but as numbers from older clients
fn phone_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum PhoneRepr {
        Text(String),
        Number(u64),
    }

    Ok(match PhoneRepr::deserialize(deserializer)? {
        PhoneRepr::Text(s) => s,
        PhoneRepr::Number(n) => n.to_string(),
    })
}
