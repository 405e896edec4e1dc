use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Connection state of a push-channel session
///
/// ```text
/// Init → Connecting → Open ⇄ ReconnectWait → Connecting …
///                       ↘              ↘
///              TerminalInvalid    TerminalExhausted
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// Order id known, no connection attempted yet
    Init = 0,
    /// Handshake in progress
    Connecting = 1,
    /// Channel established
    Open = 2,
    /// Waiting for the reconnect delay to elapse
    ReconnectWait = 3,
    /// Server declared the tracking link invalid (close code 1000)
    TerminalInvalid = 4,
    /// Retry budget spent
    TerminalExhausted = 5,
}

impl ConnectionState {
    /// No further connection attempts will be made
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ConnectionState::TerminalInvalid | ConnectionState::TerminalExhausted
        )
    }

    #[inline]
    pub fn is_open(self) -> bool {
        self == ConnectionState::Open
    }

    /// Label used in logs and diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Init => "INIT",
            ConnectionState::Connecting => "CONNECTING",
            ConnectionState::Open => "OPEN",
            ConnectionState::ReconnectWait => "RECONNECT_WAIT",
            ConnectionState::TerminalInvalid => "TERMINAL_INVALID",
            ConnectionState::TerminalExhausted => "TERMINAL_EXHAUSTED",
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Init,
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Open,
            3 => ConnectionState::ReconnectWait,
            4 => ConnectionState::TerminalInvalid,
            _ => ConnectionState::TerminalExhausted,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free cell holding a [`ConnectionState`]
///
/// Written by the task that drives the session, read from anywhere.
#[derive(Debug)]
pub struct AtomicConnectionState {
    inner: AtomicU8,
}

impl AtomicConnectionState {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_u8(self.inner.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, state: ConnectionState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Transition only if the current state is `current`
    ///
    /// Returns the previous state on failure.
    pub fn compare_exchange(
        &self,
        current: ConnectionState,
        new: ConnectionState,
    ) -> Result<ConnectionState, ConnectionState> {
        self.inner
            .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(ConnectionState::from_u8)
            .map_err(ConnectionState::from_u8)
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get().is_open()
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.get().is_terminal()
    }
}

impl Default for AtomicConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Init)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_all_states() {
        let states = [
            ConnectionState::Init,
            ConnectionState::Connecting,
            ConnectionState::Open,
            ConnectionState::ReconnectWait,
            ConnectionState::TerminalInvalid,
            ConnectionState::TerminalExhausted,
        ];
        let cell = AtomicConnectionState::default();
        for state in states {
            cell.set(state);
            assert_eq!(cell.get(), state);
        }
    }

    #[test]
    fn test_terminal_states() {
        assert!(ConnectionState::TerminalInvalid.is_terminal());
        assert!(ConnectionState::TerminalExhausted.is_terminal());
        assert!(!ConnectionState::ReconnectWait.is_terminal());
        assert!(!ConnectionState::Open.is_terminal());
    }

    #[test]
    fn test_compare_exchange_reports_previous() {
        let cell = AtomicConnectionState::new(ConnectionState::Open);
        assert_eq!(
            cell.compare_exchange(ConnectionState::Connecting, ConnectionState::Open),
            Err(ConnectionState::Open)
        );
        assert_eq!(
            cell.compare_exchange(ConnectionState::Open, ConnectionState::ReconnectWait),
            Ok(ConnectionState::Open)
        );
        assert_eq!(cell.get(), ConnectionState::ReconnectWait);
    }
}
