//! Query keys and fetch status shared by the cache and its consumers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one cached resource: a logical resource name plus its parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "resource", rename_all = "lowercase")]
pub enum QueryKey {
    /// One page of the coin market table
    Market { page: u32 },
    /// The full message request list
    Messages,
}

impl QueryKey {
    pub fn market(page: u32) -> Self {
        QueryKey::Market { page }
    }

    /// Logical resource name, without parameters
    pub fn resource(&self) -> &'static str {
        match self {
            QueryKey::Market { .. } => "market",
            QueryKey::Messages => "messages",
        }
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::Market { page } => write!(f, "market/{}", page),
            QueryKey::Messages => write!(f, "messages"),
        }
    }
}

/// Outcome of the most recent fetch for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStatus {
    /// No fetch has completed yet
    #[default]
    Loading,
    /// The last fetch failed
    Error,
    /// The last fetch (or a local write) produced data
    Success,
}
