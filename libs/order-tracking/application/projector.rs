//! Progress projection
//!
//! Turns the latest snapshot and the current time into a completion
//! percentage and minutes remaining. The percentage is the remaining share
//! of the job: it starts at 100 when work begins and falls to 0.

use crate::domain::{OrderSnapshot, OrderStatus, Projection};
use chrono::{DateTime, Utc};

/// Duration shown for a pending order the server sent no estimate for
pub const DEFAULT_PENDING_FALLBACK_MINUTES: u32 = 90;

#[derive(Debug, Clone, Copy)]
pub struct ProgressProjector {
    pending_fallback_minutes: u32,
}

impl Default for ProgressProjector {
    fn default() -> Self {
        Self::new(DEFAULT_PENDING_FALLBACK_MINUTES)
    }
}

impl ProgressProjector {
    pub fn new(pending_fallback_minutes: u32) -> Self {
        Self {
            pending_fallback_minutes,
        }
    }

    pub fn project(&self, snapshot: &OrderSnapshot, now: DateTime<Utc>) -> Projection {
        match snapshot.status {
            OrderStatus::Pending => {
                let total = snapshot
                    .total_duration_minutes
                    .filter(|m| *m > 0)
                    .unwrap_or(self.pending_fallback_minutes);
                Projection::new(100, total)
            }
            OrderStatus::InProgress => {
                let total = match snapshot.total_duration_minutes {
                    Some(total) if total > 0 => total,
                    _ => return Projection::DONE,
                };
                let elapsed = snapshot
                    .started_at
                    .map(|started| (now - started).num_minutes().max(0))
                    .unwrap_or(0);
                let total = i64::from(total);
                let percent = (100 - elapsed * 100 / total).clamp(0, 100);
                let remaining = (total - elapsed).max(0);
                Projection::new(percent as u8, remaining as u32)
            }
            OrderStatus::Completed => Projection::DONE,
        }
    }

    /// Whether the projection keeps moving without new snapshots
    pub fn advances(snapshot: &OrderSnapshot) -> bool {
        snapshot.status == OrderStatus::InProgress
    }
}
