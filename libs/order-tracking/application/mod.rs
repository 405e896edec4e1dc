//! Application Layer
//!
//! Reconciliation, projection and the session that ties them to the push
//! channel.

pub mod projector;
pub mod reconciler;
pub mod session;

pub use projector::ProgressProjector;
pub use reconciler::{ReconcileOutcome, SnapshotReconciler};
pub use session::{
    Diagnostics, SessionAction, SessionBuilder, SessionEvent, SessionFailure, SessionInput,
    SessionMachine, SessionView, TrackingSession,
};
