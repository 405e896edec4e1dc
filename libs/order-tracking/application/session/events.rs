//! Observable session state and notifications

use crate::domain::{OrderSnapshot, Projection};
use pushsocket::ConnectionState;
use std::time::Duration;
use thiserror::Error;

/// Why a session stopped for good
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFailure {
    /// The server closed the channel with the normal-closure code
    #[error("tracking link is invalid")]
    InvalidLink,

    #[error("could not retrieve order data after {attempts} attempts")]
    RetryExhausted { attempts: usize },
}

impl SessionFailure {
    /// Text for the person holding the tracking link
    pub fn user_message(&self) -> &'static str {
        match self {
            SessionFailure::InvalidLink => {
                "This tracking link is no longer valid. Please scan the QR code again."
            }
            SessionFailure::RetryExhausted { .. } => {
                "Could not retrieve order data. This may be a temporary connection problem, please try again later."
            }
        }
    }
}

/// Connection details for troubleshooting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub ws_url: String,
    /// Channels opened so far, including the current one
    pub connection_attempts: usize,
    pub socket_state: &'static str,
    /// `None` until a probe has completed
    pub server_reachable: Option<bool>,
    pub probe_detail: Option<String>,
}

/// Read-only snapshot of a session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionView {
    pub order_id: String,
    pub connection: ConnectionState,
    /// `None` until the first valid push
    pub snapshot: Option<OrderSnapshot>,
    pub projection: Option<Projection>,
    pub last_error: Option<String>,
    pub failure: Option<SessionFailure>,
    pub diagnostics: Diagnostics,
}

impl SessionView {
    pub fn new(order_id: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            order_id: order_id.into(),
            connection: ConnectionState::Init,
            snapshot: None,
            projection: None,
            last_error: None,
            failure: None,
            diagnostics: Diagnostics {
                ws_url: ws_url.into(),
                connection_attempts: 0,
                socket_state: ConnectionState::Init.as_str(),
                server_reachable: None,
                probe_detail: None,
            },
        }
    }
}

/// Notification emitted by a session, in the order things happened
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged(ConnectionState),
    SnapshotUpdated(Box<OrderSnapshot>),
    ProjectionUpdated(Projection),
    /// A failure was absorbed and another connection will follow
    Reconnecting { attempt: usize, delay: Duration },
    /// The order reached `completed` while connected. Sent once per session.
    OrderCompleted,
    Failed(SessionFailure),
    DiagnosticsUpdated(Diagnostics),
}
