//! Live tracking session for one order
//!
//! ```rust,ignore
//! use order_tracking::{LocationResolver, TrackerConfig, TrackingSession, SessionEvent};
//!
//! let config = TrackerConfig::default();
//! let session = TrackingSession::builder()
//!     .resolver(LocationResolver::new("https://tracking.example.kg/track/42"))
//!     .config(&config)
//!     .start()?;
//!
//! while let Some(event) = session.try_recv_event() {
//!     if let SessionEvent::Failed(failure) = event {
//!         eprintln!("{}", failure.user_message());
//!     }
//! }
//! session.stop().await;
//! ```

pub mod builder;
mod driver;
pub mod events;
pub mod machine;

pub use builder::SessionBuilder;
pub use events::{Diagnostics, SessionEvent, SessionFailure, SessionView};
pub use machine::{SessionAction, SessionInput, SessionMachine};

use crate::infrastructure::probe::ReachabilityProbe;
use builder::states::NoResolver;
use driver::SharedView;
use pushsocket::ConnectionState;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a running session
///
/// Dropping the handle tears the session down.
pub struct TrackingSession {
    order_id: String,
    shared: Arc<SharedView>,
    events: crossbeam_channel::Receiver<SessionEvent>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl TrackingSession {
    pub fn builder() -> SessionBuilder<NoResolver> {
        SessionBuilder::new()
    }

    pub(crate) fn spawn(
        machine: SessionMachine,
        probe: Option<Arc<dyn ReachabilityProbe>>,
    ) -> Self {
        let order_id = machine.view().order_id.clone();
        let shared = Arc::new(SharedView::new(machine.view().clone()));
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let driver = driver::SessionDriver::new(machine, Arc::clone(&shared), events_tx, probe);
        let task = tokio::spawn(driver.run(shutdown_rx));

        Self {
            order_id,
            shared,
            events: events_rx,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn order_id(&self) -> &str {
        &self.order_id
    }

    /// Copy of the latest published view
    pub fn view(&self) -> SessionView {
        self.shared.view.read().clone()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.shared.state.get()
    }

    /// Whether the session can no longer make progress
    pub fn is_finished(&self) -> bool {
        self.connection_state().is_terminal()
            || self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    pub fn try_recv_event(&self) -> Option<SessionEvent> {
        self.events.try_recv().ok()
    }

    /// Wait for the next event. Blocks the calling thread.
    pub fn recv_event_timeout(&self, timeout: Duration) -> Option<SessionEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    /// Receiver for `crossbeam_channel::select!` in synchronous consumers
    pub fn events(&self) -> &crossbeam_channel::Receiver<SessionEvent> {
        &self.events
    }

    /// Tear down and wait for the driver to exit
    pub async fn stop(mut self) {
        self.signal_stop();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                debug!(order_id = %self.order_id, error = %e, "Session task ended abnormally");
            }
        }
    }

    fn signal_stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            // Driver already gone when the session ended on its own
            let _ = tx.send(());
        }
    }
}

impl Drop for TrackingSession {
    fn drop(&mut self) {
        self.signal_stop();
    }
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("order_id", &self.order_id)
            .field("state", &self.connection_state())
            .finish()
    }
}
