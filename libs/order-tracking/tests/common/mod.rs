//! Common test utilities for order-tracking integration tests
//!
//! Provides a mock order server that plays one scripted behavior per
//! accepted connection, plus helpers for waiting on session events.

#![allow(dead_code)]

use futures::{SinkExt, StreamExt};
use order_tracking::{SessionEvent, TrackingSession};
use parking_lot::Mutex;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Notify;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
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

/// How a connection ends after its frames are sent
#[derive(Debug, Clone)]
pub enum Ending {
    /// Keep the socket open until the client leaves
    Hold,
    /// Send a close frame with this code
    Close(u16),
}

/// Script for one accepted connection
#[derive(Debug, Clone)]
pub struct Behavior {
    pub frames: Vec<String>,
    pub ending: Ending,
}

impl Behavior {
    pub fn hold(frames: Vec<String>) -> Self {
        Self {
            frames,
            ending: Ending::Hold,
        }
    }

    pub fn close(frames: Vec<String>, code: u16) -> Self {
        Self {
            frames,
            ending: Ending::Close(code),
        }
    }
}

/// Mock push server. Connection N plays behavior N; the last one repeats.
pub struct MockOrderServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
    shutdown: Arc<Notify>,
}

impl MockOrderServer {
    pub async fn start(behaviors: Vec<Behavior>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let paths = Arc::new(Mutex::new(Vec::new()));
        let shutdown = Arc::new(Notify::new());
        let queue = Arc::new(Mutex::new(VecDeque::from(behaviors)));

        let accepted_clone = accepted.clone();
        let paths_clone = paths.clone();
        let shutdown_clone = shutdown.clone();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { break };
                        accepted_clone.fetch_add(1, Ordering::SeqCst);

                        let behavior = {
                            let mut queue = queue.lock();
                            if queue.len() > 1 {
                                queue.pop_front()
                            } else {
                                queue.front().cloned()
                            }
                        };
                        let Some(behavior) = behavior else { continue };

                        let paths = paths_clone.clone();
                        let shutdown = shutdown_clone.clone();
                        tokio::spawn(async move {
                            Self::handle_connection(stream, behavior, paths, shutdown).await;
                        });
                    }
                    _ = shutdown_clone.notified() => break,
                }
            }
        });

        Self {
            addr,
            accepted,
            paths,
            shutdown,
        }
    }

    async fn handle_connection(
        stream: TcpStream,
        behavior: Behavior,
        paths: Arc<Mutex<Vec<String>>>,
        shutdown: Arc<Notify>,
    ) {
        let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
            paths.lock().push(request.uri().path().to_string());
            Ok(response)
        };
        let ws_stream = match accept_hdr_async(stream, callback).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };
        let (mut write, mut read) = ws_stream.split();

        for frame in behavior.frames {
            if write.send(Message::Text(frame)).await.is_err() {
                return;
            }
        }

        if let Ending::Close(code) = behavior.ending {
            let close = CloseFrame {
                code: CloseCode::from(code),
                reason: Cow::Borrowed("scripted close"),
            };
            let _ = write.send(Message::Close(Some(close))).await;
        }

        loop {
            tokio::select! {
                msg = read.next() => match msg {
                    Some(Ok(_)) => {}
                    Some(Err(_)) | None => break,
                },
                _ = shutdown.notified() => break,
            }
        }
    }

    /// Host and port, as a tracker config `host` value
    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Request paths seen during handshakes
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().clone()
    }

    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockOrderServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Accepts TCP connections and never answers the handshake
pub struct SilentServer {
    pub addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    task: tokio::task::JoinHandle<()>,
}

impl SilentServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let accepted_clone = accepted.clone();

        let task = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                accepted_clone.fetch_add(1, Ordering::SeqCst);
                held.push(stream);
            }
        });

        Self {
            addr,
            accepted,
            task,
        }
    }

    pub fn host(&self) -> String {
        self.addr.to_string()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }
}

impl Drop for SilentServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Host nobody listens on
pub async fn unused_host() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr.to_string()
}

pub fn order_json(id: i64, status: &str, queue_position: u32) -> String {
    format!(
        r#"{{"id": {}, "status": "{}", "queue_position": {}, "client_name": "Test Client", "created_at": "2024-05-01T10:00:00Z", "updated_at": "2024-05-01T10:00:00Z"}}"#,
        id, status, queue_position
    )
}

/// Collect events until `done` matches one, or the timeout passes
pub async fn collect_until<F>(
    session: &TrackingSession,
    timeout: Duration,
    mut done: F,
) -> (Vec<SessionEvent>, bool)
where
    F: FnMut(&SessionEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    let mut events = Vec::new();

    while tokio::time::Instant::now() < deadline {
        while let Some(event) = session.try_recv_event() {
            verbose_println!("  event: {:?}", event);
            let finished = done(&event);
            events.push(event);
            if finished {
                return (events, true);
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    (events, false)
}
