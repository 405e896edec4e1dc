use thiserror::Error;

/// Main error type for pushsocket
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushSocketError {
    /// WebSocket handshake or transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Stream ended without a close frame
    #[error("Connection closed: {0}")]
    ConnectionClosed(String),

    /// Connection was not established in time
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Invalid channel address or settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Event receiver is gone
    #[error("Channel send error: {0}")]
    ChannelSend(String),
}

impl PushSocketError {
    /// Whether a fresh connection attempt could succeed after this error
    pub fn is_transient(&self) -> bool {
        !matches!(self, PushSocketError::Configuration(_))
    }
}

/// Result type for pushsocket operations
pub type Result<T> = std::result::Result<T, PushSocketError>;
