//! Infrastructure Layer
//!
//! Configuration, logging, time, address derivation and the HTTP probe.

pub mod clock;
pub mod config;
pub mod endpoint;
pub mod logging;
pub mod probe;
pub mod resolver;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, SessionSettings, TrackerConfig};
pub use endpoint::Endpoint;
pub use logging::init_tracing;
pub use probe::{HttpProbe, ProbeReport, ReachabilityProbe};
pub use resolver::{ExplicitId, LocationResolver, OrderIdResolver};
