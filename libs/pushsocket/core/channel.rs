//! Channel task owning a single WebSocket connection
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐
//! │  Channel task (gen N)    │
//! │                          │
//! │  1. Handshake            │──> Opened / Error
//! │  2. Read frames          │──> Message / Closed / Error ──> Unbounded mpsc ──> Owner
//! │  3. Close on signal      │
//! └──────────────────────────┘
//! ```
//!
//! The task reports at most one terminal event (`Error` or `Closed`) and then
//! exits. When the owner closes or drops the [`ChannelHandle`], the task sends
//! a close frame and exits silently, so a detached handle never drives the
//! owner's state.

use crate::traits::message::{from_tungstenite, WsMessage};
use crate::traits::{PushSocketError, Result};
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::connect_async_with_config;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Close code for normal closure (RFC 6455 §7.4.1)
pub const NORMAL_CLOSURE: u16 = 1000;

/// Lifecycle event of one channel handle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEventKind {
    /// Handshake completed
    Opened,
    /// Data frame received
    Message(WsMessage),
    /// Handshake failed or the transport broke
    Error(PushSocketError),
    /// Peer closed the channel (or the stream ended without a close frame)
    Closed { code: Option<u16>, reason: String },
}

/// Event tagged with the generation of the handle that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelEvent {
    pub generation: u64,
    pub kind: ChannelEventKind,
}

/// Owner's handle to a running channel task
///
/// Closing or dropping the handle stops the task. Events it already queued
/// keep their generation, so the owner can discard them.
#[derive(Debug)]
pub struct ChannelHandle {
    generation: u64,
    url: String,
    close_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ChannelHandle {
    /// Spawn a channel task connecting to `url`
    ///
    /// Must be called from within a Tokio runtime. Fails only when the
    /// address is not a `ws://` or `wss://` URL; connection failures are
    /// reported as [`ChannelEventKind::Error`].
    pub fn open(
        url: impl Into<String>,
        generation: u64,
        events: mpsc::UnboundedSender<ChannelEvent>,
    ) -> Result<Self> {
        let url = url.into();
        validate_url(&url)?;

        let (close_tx, close_rx) = oneshot::channel();
        let task_url = url.clone();
        let task = tokio::spawn(async move {
            run_channel(task_url, generation, events, close_rx).await;
        });

        debug!(generation, url = %url, "Channel task spawned");

        Ok(Self {
            generation,
            url,
            close_tx: Some(close_tx),
            task: Some(task),
        })
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the channel task has exited
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Signal the task to send a close frame and exit
    pub fn close(mut self) {
        self.signal_close();
    }

    fn signal_close(&mut self) {
        if let Some(close_tx) = self.close_tx.take() {
            debug!(generation = self.generation, "Closing channel");
            // Receiver is gone when the task already exited
            let _ = close_tx.send(());
        }
        // The task finishes on its own after the close signal
        self.task.take();
    }
}

impl Drop for ChannelHandle {
    fn drop(&mut self) {
        self.signal_close();
    }
}

fn validate_url(url: &str) -> Result<()> {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        Ok(())
    } else {
        Err(PushSocketError::Configuration(format!(
            "channel address must use ws:// or wss://: {url}"
        )))
    }
}

/// Main channel task
async fn run_channel(
    url: String,
    generation: u64,
    events: mpsc::UnboundedSender<ChannelEvent>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let emit = |kind: ChannelEventKind| {
        events
            .send(ChannelEvent { generation, kind })
            .map_err(|e| PushSocketError::ChannelSend(e.to_string()))
    };

    let ws_config = WebSocketConfig {
        max_message_size: Some(16 << 20),
        max_frame_size: Some(4 << 20),
        ..Default::default()
    };

    let ws_stream = tokio::select! {
        _ = &mut close_rx => {
            debug!(generation, "Channel closed before handshake completed");
            return;
        }
        result = connect_async_with_config(url.as_str(), Some(ws_config), true) => {
            match result {
                Ok((stream, _)) => stream,
                Err(e) => {
                    warn!(generation, error = %e, "Channel handshake failed");
                    let _ = emit(ChannelEventKind::Error(PushSocketError::WebSocket(e.to_string())));
                    return;
                }
            }
        }
    };

    if emit(ChannelEventKind::Opened).is_err() {
        debug!(generation, "Event receiver dropped, abandoning channel");
        return;
    }

    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            _ = &mut close_rx => {
                debug!(generation, "Close requested by owner");
                let _ = write.send(Message::Close(None)).await;
                let _ = write.close().await;
                return;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = frame
                            .map(|f| (Some(u16::from(f.code)), f.reason.into_owned()))
                            .unwrap_or((None, String::new()));
                        debug!(generation, ?code, reason = %reason, "Close frame received");
                        let _ = emit(ChannelEventKind::Closed { code, reason });
                        return;
                    }
                    Some(Ok(msg)) => {
                        if let Some(ws_msg) = from_tungstenite(msg) {
                            if emit(ChannelEventKind::Message(ws_msg)).is_err() {
                                return;
                            }
                        }
                    }
                    Some(Err(e)) => {
                        warn!(generation, error = %e, "Channel transport error");
                        let _ = emit(ChannelEventKind::Error(PushSocketError::WebSocket(e.to_string())));
                        return;
                    }
                    None => {
                        let _ = emit(ChannelEventKind::Closed {
                            code: None,
                            reason: PushSocketError::ConnectionClosed("stream ended".into()).to_string(),
                        });
                        return;
                    }
                }
            }
        }
    }
}
