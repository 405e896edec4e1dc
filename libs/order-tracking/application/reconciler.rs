//! Snapshot reconciliation
//!
//! Each inbound frame is decoded, normalized and compared with the held
//! snapshot. Identical payloads produce no transition. Only one
//! reconciliation runs at a time; an overlapping call is dropped.

use crate::domain::OrderSnapshot;
use crate::error::TrackerError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use pushsocket::WsMessage;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

/// Result of reconciling one frame
#[derive(Debug, Clone, PartialEq)]
pub enum ReconcileOutcome {
    /// The held snapshot was replaced
    Updated {
        snapshot: OrderSnapshot,
        /// Status, start time or duration differ from the previous snapshot
        /// (always true for the first snapshot)
        projection_inputs_changed: bool,
    },
    /// Structurally equal to the held snapshot
    Unchanged,
    /// Another reconciliation was in flight
    Dropped,
    /// Payload was not a JSON object. The held snapshot is kept.
    Malformed(TrackerError),
}

/// Holds the canonical snapshot of one order
#[derive(Debug, Default)]
pub struct SnapshotReconciler {
    current: Mutex<Option<OrderSnapshot>>,
    in_flight: AtomicBool,
}

/// Marks a reconciliation as in flight until dropped
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl SnapshotReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the single-flight slot. `None` while another holder exists.
    pub fn begin(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                flag: &self.in_flight,
            })
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn current(&self) -> Option<OrderSnapshot> {
        self.current.lock().clone()
    }

    pub fn reconcile(&self, message: &WsMessage, now: DateTime<Utc>) -> ReconcileOutcome {
        let Some(_guard) = self.begin() else {
            debug!("Reconciliation already in flight, dropping frame");
            return ReconcileOutcome::Dropped;
        };

        let value = match decode(message) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, len = message.len(), "Discarding malformed frame");
                return ReconcileOutcome::Malformed(e);
            }
        };

        let mut current = self.current.lock();
        let (created_fallback, updated_fallback) = current
            .as_ref()
            .map(|held| (held.created_at, held.updated_at))
            .unwrap_or((now, now));

        let snapshot = match OrderSnapshot::from_value(&value, created_fallback, updated_fallback) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(error = %e, "Discarding malformed frame");
                return ReconcileOutcome::Malformed(e);
            }
        };

        let projection_inputs_changed = match current.as_ref() {
            Some(held) if *held == snapshot => {
                debug!(order = snapshot.id, "Snapshot unchanged");
                return ReconcileOutcome::Unchanged;
            }
            Some(held) => held.projection_inputs() != snapshot.projection_inputs(),
            None => true,
        };

        debug!(
            order = snapshot.id,
            status = %snapshot.status,
            queue = snapshot.queue_position,
            projection_inputs_changed,
            "Snapshot updated"
        );
        *current = Some(snapshot.clone());

        ReconcileOutcome::Updated {
            snapshot,
            projection_inputs_changed,
        }
    }
}

fn decode(message: &WsMessage) -> Result<Value, TrackerError> {
    let value = match message {
        WsMessage::Text(text) => serde_json::from_str(text)?,
        WsMessage::Binary(bytes) => serde_json::from_slice(bytes)?,
    };
    Ok(value)
}
