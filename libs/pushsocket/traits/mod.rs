//! # PushSocket Traits
//!
//! Core traits and types shared by the channel runtime and its consumers:
//!
//! - **WsMessage**: payload of a data frame (text or binary)
//! - **ReconnectionStrategy**: delay and budget for the next connection attempt
//! - **PushSocketError**: error type for channel operations

pub mod error;
pub mod message;
pub mod reconnect;

// Re-export commonly used types
pub use error::{PushSocketError, Result};
pub use message::WsMessage;
pub use reconnect::{FailureCause, FixedDelay, ReconnectionStrategy};
