//! Error types for order tracking

use crate::application::session::SessionFailure;
use crate::infrastructure::config::ConfigError;
use pushsocket::PushSocketError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Missing order id or unusable settings. Fatal, no connection is made.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Push channel failure that the retry policy may recover from
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server closed the channel with the normal-closure code
    #[error("Tracking link is no longer valid")]
    ProtocolTerminal,

    #[error("Retry budget exhausted after {attempts} attempts")]
    RetryExhausted { attempts: usize },

    /// Inbound payload was not a JSON object
    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("Reachability probe failed: {0}")]
    Probe(String),

    #[error("Config file error: {0}")]
    Config(String),
}

impl TrackerError {
    /// Whether the error ends the session
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TrackerError::Configuration(_)
                | TrackerError::ProtocolTerminal
                | TrackerError::RetryExhausted { .. }
                | TrackerError::Config(_)
        )
    }
}

impl From<PushSocketError> for TrackerError {
    fn from(err: PushSocketError) -> Self {
        match err {
            PushSocketError::Configuration(msg) => TrackerError::Configuration(msg),
            other => TrackerError::Transport(other.to_string()),
        }
    }
}

impl From<ConfigError> for TrackerError {
    fn from(err: ConfigError) -> Self {
        TrackerError::Config(err.to_string())
    }
}

impl From<SessionFailure> for TrackerError {
    fn from(failure: SessionFailure) -> Self {
        match failure {
            SessionFailure::InvalidLink => TrackerError::ProtocolTerminal,
            SessionFailure::RetryExhausted { attempts } => TrackerError::RetryExhausted { attempts },
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::MalformedMessage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
