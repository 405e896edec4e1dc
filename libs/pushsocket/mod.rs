//! # PushSocket
//!
//! Single-handle WebSocket plumbing for server-push channels.
//!
//! ## Features
//!
//! - **One live handle**: each [`ChannelHandle`] owns exactly one socket task and
//!   closes it when dropped
//! - **Generation tagging**: every [`ChannelEvent`] carries the generation of the
//!   handle that produced it, so a consumer can ignore events from detached handles
//! - **Pluggable retry**: [`ReconnectionStrategy`] decides delay and budget per failure
//! - **Lock-free state cell**: [`AtomicConnectionState`] for cheap cross-thread reads
//!
//! The library does not run a reconnect loop itself. The owner of the handle feeds
//! channel events into its own state machine and decides when to open the next one.

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    channel, connection_state,
    channel::{ChannelEvent, ChannelEventKind, ChannelHandle, NORMAL_CLOSURE},
    connection_state::{AtomicConnectionState, ConnectionState},
};

/// Type alias for Result with PushSocketError
pub type Result<T> = std::result::Result<T, traits::PushSocketError>;
