use serde::Serialize;

/// Derived progress of an order, never received from the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Projection {
    /// Remaining capacity, 0..=100
    pub progress_percent: u8,
    pub remaining_minutes: u32,
}

impl Projection {
    pub const DONE: Projection = Projection {
        progress_percent: 0,
        remaining_minutes: 0,
    };

    pub fn new(progress_percent: u8, remaining_minutes: u32) -> Self {
        Self {
            progress_percent: progress_percent.min(100),
            remaining_minutes,
        }
    }

    /// Remaining time in seconds, for `mm:ss` displays
    pub fn remaining_seconds(&self) -> u64 {
        u64::from(self.remaining_minutes) * 60
    }
}
