//! Order Tracking
//!
//! Live status of a single car-service order, fed by a server-push channel.
//!
//! The session keeps one push channel open per order, retries transient
//! failures on a fixed schedule, stops for good when the server declares the
//! link invalid, and projects progress locally between snapshots.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::{
    Diagnostics, ProgressProjector, ReconcileOutcome, SessionAction, SessionBuilder,
    SessionEvent, SessionFailure, SessionInput, SessionMachine, SessionView, SnapshotReconciler,
    TrackingSession,
};
pub use domain::{OrderSnapshot, OrderStatus, PackageDetail, Projection};
pub use error::{Result, TrackerError};
pub use infrastructure::{
    init_tracing, Clock, ConfigError, Endpoint, ExplicitId, HttpProbe, LocationResolver,
    ManualClock, OrderIdResolver, ProbeReport, ReachabilityProbe, SessionSettings,
    SystemClock, TrackerConfig,
};
pub use pushsocket::ConnectionState;
