//! Event bus error types

use thiserror::Error;

/// Errors from sending a message to other participants
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport is closed")]
    Closed,

    #[error("Failed to deliver to {failed} of {total} peers")]
    Partial { failed: usize, total: usize },
}

/// Errors from broadcast channels
#[derive(Debug, Error)]
pub enum EventError {
    #[error("Failed to encode message for channel {channel}: {source}")]
    Encode {
        channel: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to decode message for channel {channel}: {source}")]
    Decode {
        channel: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No broadcast channel named '{0}'")]
    UnknownChannel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EventError::UnknownChannel("nope".to_string());
        assert_eq!(err.to_string(), "No broadcast channel named 'nope'");

        let err = TransportError::Partial { failed: 1, total: 3 };
        assert_eq!(err.to_string(), "Failed to deliver to 1 of 3 peers");
    }
}
