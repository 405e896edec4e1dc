use std::time::Duration;

/// Why the previous connection attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCause {
    /// The handshake did not complete within the connection timeout
    ConnectTimeout,
    /// Transport-level error (handshake refused, reset, protocol violation)
    TransportError,
    /// The peer closed the channel with a code that allows retrying
    Closed,
}

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how the owner of a channel
/// behaves after a failed or lost connection.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next connection attempt
    ///
    /// # Arguments
    /// * `attempt` - Consecutive failures so far, including this one (1-indexed).
    ///   This is also the number of the reconnection that would follow.
    /// * `cause` - What ended the previous attempt
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting (zero = immediately)
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize, cause: FailureCause) -> Option<Duration>;

    /// Check if we should continue reconnecting
    ///
    /// # Arguments
    /// * `attempt` - Consecutive failures so far, including this one (1-indexed)
    fn should_reconnect(&self, attempt: usize) -> bool;

    /// Maximum number of reconnections after consecutive failures (None = unlimited)
    fn max_attempts(&self) -> Option<usize>;
}

/// Fixed delay reconnection strategy
///
/// Waits the same amount of time after a close or transport error. A
/// connection timeout has already spent its wait, so the next attempt
/// starts immediately.
///
/// The budget counts reconnections, not connections: with
/// `max_attempts = Some(5)` the first five failures in a row each get a
/// reconnect, and the sixth returns `None`.
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    /// Create a new fixed delay strategy
    ///
    /// # Arguments
    /// * `delay` - The fixed delay between reconnects
    /// * `max_attempts` - Maximum reconnections in a row (None = unlimited)
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize, cause: FailureCause) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        match cause {
            FailureCause::ConnectTimeout => Some(Duration::ZERO),
            FailureCause::TransportError | FailureCause::Closed => Some(self.delay),
        }
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt <= max)
    }

    fn max_attempts(&self) -> Option<usize> {
        self.max_attempts
    }
}
