//! Async driver for one tracking session
//!
//! A single task owns the machine, the live channel handle and every timer.
//! All inputs are serialized through one `tokio::select!` loop, so handlers
//! never overlap. After each input the view is republished and the emitted
//! events are forwarded to the session's subscriber.

use super::events::{SessionEvent, SessionView};
use super::machine::{SessionAction, SessionInput, SessionMachine};
use crate::infrastructure::probe::{ProbeReport, ReachabilityProbe};
use parking_lot::RwLock;
use pushsocket::{AtomicConnectionState, ChannelEvent, ChannelEventKind, ChannelHandle};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, sleep_until, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// State the driver publishes for readers on other threads
#[derive(Debug)]
pub(crate) struct SharedView {
    pub view: RwLock<SessionView>,
    pub state: AtomicConnectionState,
}

impl SharedView {
    pub fn new(view: SessionView) -> Self {
        Self {
            state: AtomicConnectionState::new(view.connection),
            view: RwLock::new(view),
        }
    }
}

pub(crate) struct SessionDriver {
    machine: SessionMachine,
    shared: Arc<SharedView>,
    events: crossbeam_channel::Sender<SessionEvent>,
    probe: Option<Arc<dyn ReachabilityProbe>>,

    channel: Option<ChannelHandle>,
    channel_tx: mpsc::UnboundedSender<ChannelEvent>,
    channel_rx: mpsc::UnboundedReceiver<ChannelEvent>,
    probe_tx: mpsc::UnboundedSender<ProbeReport>,
    probe_rx: mpsc::UnboundedReceiver<ProbeReport>,
    probe_task: Option<JoinHandle<()>>,

    connect_deadline: Option<(u64, Instant)>,
    reconnect_at: Option<Instant>,
    ticker: Option<Interval>,
}

impl SessionDriver {
    pub fn new(
        machine: SessionMachine,
        shared: Arc<SharedView>,
        events: crossbeam_channel::Sender<SessionEvent>,
        probe: Option<Arc<dyn ReachabilityProbe>>,
    ) -> Self {
        let (channel_tx, channel_rx) = mpsc::unbounded_channel();
        let (probe_tx, probe_rx) = mpsc::unbounded_channel();
        Self {
            machine,
            shared,
            events,
            probe,
            channel: None,
            channel_tx,
            channel_rx,
            probe_tx,
            probe_rx,
            probe_task: None,
            connect_deadline: None,
            reconnect_at: None,
            ticker: None,
        }
    }

    /// Run until stopped or a terminal state is reached
    pub async fn run(mut self, mut shutdown: oneshot::Receiver<()>) {
        let order_id = self.machine.view().order_id.clone();
        info!(order_id = %order_id, "Session driver started");

        self.step(SessionInput::Start);

        while !self.machine.is_finished() {
            let input = tokio::select! {
                biased;

                // Dropping the sender counts as a stop request
                _ = &mut shutdown => SessionInput::Stop,

                Some(event) = self.channel_rx.recv() => SessionInput::from(event),

                Some(report) = self.probe_rx.recv() => SessionInput::ProbeCompleted(report),

                generation = deadline(self.connect_deadline) => {
                    self.connect_deadline = None;
                    SessionInput::ConnectTimeout { generation }
                }

                _ = sleep_until_opt(self.reconnect_at) => {
                    self.reconnect_at = None;
                    SessionInput::ReconnectDue
                }

                _ = next_tick(&mut self.ticker) => SessionInput::ProjectionTick,
            };

            self.step(input);
        }

        self.shutdown();
        info!(order_id = %order_id, state = %self.machine.state(), "Session driver exited");
    }

    fn step(&mut self, input: SessionInput) {
        let actions = self.machine.handle(input);
        if actions.is_empty() {
            return;
        }

        let mut emitted = Vec::new();
        for action in actions {
            match action {
                SessionAction::Emit(event) => emitted.push(event),
                other => self.apply(other),
            }
        }

        // The view goes out before the events so a subscriber reads a view at
        // least as new. The state cell goes out after them, so a terminal
        // state is only observable once its Failed event is queued.
        *self.shared.view.write() = self.machine.view().clone();

        for event in emitted {
            if self.events.send(event).is_err() {
                debug!("Event subscriber gone");
                break;
            }
        }

        self.shared.state.set(self.machine.state());
    }

    fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::OpenChannel { generation, url } => {
                // Exactly one live handle: the previous one closes first
                self.channel.take();
                match ChannelHandle::open(url, generation, self.channel_tx.clone()) {
                    Ok(handle) => self.channel = Some(handle),
                    Err(e) => {
                        warn!(generation, error = %e, "Failed to open channel");
                        // Report through the normal path so the retry policy applies
                        let _ = self.channel_tx.send(ChannelEvent {
                            generation,
                            kind: ChannelEventKind::Error(e),
                        });
                    }
                }
            }
            SessionAction::CloseChannel => {
                if let Some(handle) = self.channel.take() {
                    handle.close();
                }
            }
            SessionAction::ArmConnectTimeout { generation, after } => {
                self.connect_deadline = Some((generation, Instant::now() + after));
            }
            SessionAction::CancelConnectTimeout => self.connect_deadline = None,
            SessionAction::ScheduleReconnect { after } => {
                self.reconnect_at = Some(Instant::now() + after);
            }
            SessionAction::CancelReconnect => self.reconnect_at = None,
            SessionAction::StartTicker { period } => {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                self.ticker = Some(ticker);
            }
            SessionAction::StopTicker => self.ticker = None,
            SessionAction::StartProbe => self.start_probe(),
            SessionAction::Emit(_) => {}
        }
    }

    fn start_probe(&mut self) {
        let Some(probe) = self.probe.clone() else {
            return;
        };
        if self.probe_task.as_ref().map_or(false, |task| !task.is_finished()) {
            return;
        }

        let tx = self.probe_tx.clone();
        self.probe_task = Some(tokio::spawn(async move {
            let report = probe.probe().await;
            let _ = tx.send(report);
        }));
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.channel.take() {
            handle.close();
        }
        if let Some(task) = self.probe_task.take() {
            task.abort();
        }
        self.connect_deadline = None;
        self.reconnect_at = None;
        self.ticker = None;
    }
}

/// Resolves with the generation once the deadline passes, never when unset
async fn deadline(deadline: Option<(u64, Instant)>) -> u64 {
    match deadline {
        Some((generation, at)) => {
            sleep_until(at).await;
            generation
        }
        None => std::future::pending().await,
    }
}

async fn sleep_until_opt(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}
