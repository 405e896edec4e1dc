//! Common test utilities for PushSocket integration tests
//!
//! This module provides a scripted mock WebSocket server.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use std::borrow::Cow;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// What the server does with every accepted connection
#[derive(Debug, Clone)]
pub enum Script {
    /// Echo data frames back until the client leaves
    Echo,
    /// Send the frames, then close with the given code
    SendThenClose { frames: Vec<String>, code: u16 },
    /// Complete the handshake, then drop the TCP stream without a close frame
    DropAfterHandshake,
}

/// A simple mock WebSocket server for testing
pub struct MockWsServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();
        let accepted = Arc::new(AtomicUsize::new(0));
        let accepted_clone = accepted.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                accepted_clone.fetch_add(1, Ordering::SeqCst);
                                let script = script.clone();
                                let shutdown = shutdown_clone.clone();
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, script, shutdown).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            accepted,
            shutdown,
        }
    }

    async fn handle_connection(stream: tokio::net::TcpStream, script: Script, shutdown: Arc<Notify>) {
        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();

        match script {
            Script::Echo => loop {
                tokio::select! {
                    msg = read.next() => {
                        match msg {
                            Some(Ok(msg)) if msg.is_text() || msg.is_binary() => {
                                if write.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            Some(Ok(msg)) if msg.is_close() => break,
                            Some(Ok(_)) => {}
                            Some(Err(_)) | None => break,
                        }
                    }
                    _ = shutdown.notified() => break,
                }
            },
            Script::SendThenClose { frames, code } => {
                for frame in frames {
                    if write.send(Message::Text(frame)).await.is_err() {
                        return;
                    }
                }
                let close = CloseFrame {
                    code: CloseCode::from(code),
                    reason: Cow::Borrowed("scripted close"),
                };
                let _ = write.send(Message::Close(Some(close))).await;
                // Drain until the client acknowledges
                while let Some(Ok(_)) = read.next().await {}
            }
            Script::DropAfterHandshake => {
                drop(write);
                drop(read);
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}/ws/order/test/", self.addr)
    }

    /// Number of accepted TCP connections
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Address nobody listens on
pub async fn unused_ws_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{}/ws/order/test/", addr)
}
