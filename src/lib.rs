//! Order Tracker - Main Library
//!
//! Terminal front end for following a car-service order live.
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (CLI, runners, display)
//! - **order_tracking**: Session, reconciliation and projection (re-exported from workspace)
//! - **pushsocket**: Push-channel plumbing (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust
//! use order_tracker::bin_common::{load_config_from_env, ConfigType};
//! use order_tracker::order_tracking::TrackingSession;
//! ```

// Re-export workspace libraries for convenience
pub use order_tracking;
pub use pushsocket;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod display;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, usage, ConfigType, TrackArgs};
    pub use runner::{BinaryRunner, RunConfig};
}
