//! # PushSocket core
//!
//! Runtime pieces of the library:
//!
//! - [`channel`]: spawns the task that owns one WebSocket connection and
//!   reports its lifecycle as generation-tagged [`ChannelEvent`]s
//! - [`connection_state`]: session-level connection states and an atomic cell
//!   for publishing them
//!
//! ## Example
//!
//! ```rust,ignore
//! use pushsocket::{ChannelEventKind, ChannelHandle};
//!
//! let (events_tx, mut events_rx) = tokio::sync::mpsc::unbounded_channel();
//! let handle = ChannelHandle::open("wss://example.com/ws/order/42/", 1, events_tx)?;
//!
//! while let Some(event) = events_rx.recv().await {
//!     if event.generation != handle.generation() {
//!         continue; // detached handle
//!     }
//!     match event.kind {
//!         ChannelEventKind::Opened => println!("open"),
//!         ChannelEventKind::Message(msg) => println!("{:?}", msg.as_text()),
//!         ChannelEventKind::Error(e) => println!("error: {e}"),
//!         ChannelEventKind::Closed { code, .. } => println!("closed: {code:?}"),
//!     }
//! }
//! ```

pub mod channel;
pub mod connection_state;

// Re-export main types
pub use channel::{ChannelEvent, ChannelEventKind, ChannelHandle, NORMAL_CLOSURE};
pub use connection_state::{AtomicConnectionState, ConnectionState};

// Re-export traits for convenience
pub use crate::traits::*;
