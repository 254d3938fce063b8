//! Error types for pulse

use thiserror::Error;

/// Pulse-wide error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PulseError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PulseError {
    pub fn api(msg: impl Into<String>) -> Self {
        PulseError::Api(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        PulseError::Network(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        PulseError::Parse(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        PulseError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        PulseError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        PulseError::Internal(msg.into())
    }

    /// The text shown to a user, without the category prefix
    pub fn user_message(&self) -> &str {
        match self {
            PulseError::Api(msg)
            | PulseError::Network(msg)
            | PulseError::Parse(msg)
            | PulseError::Validation(msg)
            | PulseError::NotFound(msg)
            | PulseError::Internal(msg) => msg,
        }
    }
}

/// Result type alias for pulse operations
pub type PulseResult<T> = Result<T, PulseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_drops_category() {
        let err = PulseError::api("Fetching Error");
        assert_eq!(err.to_string(), "API error: Fetching Error");
        assert_eq!(err.user_message(), "Fetching Error");
    }
}
