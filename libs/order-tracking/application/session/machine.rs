//! Session state machine
//!
//! # Architecture
//!
//! ```text
//!   SessionInput ──> SessionMachine::handle ──> Vec<SessionAction>
//!   (channel events,      (pure, no I/O)         (open/close channel,
//!    timers, stop)                                arm timers, emit events)
//! ```
//!
//! The machine owns the connection state, the retry budget, the reconciler
//! and the projector. It never touches sockets or timers itself; the driver
//! task performs the returned actions and feeds their results back in.
//!
//! Every channel carries a generation. Inputs from any generation other
//! than the current one are ignored, which detaches a replaced channel.

use super::events::{SessionEvent, SessionFailure, SessionView};
use crate::application::projector::ProgressProjector;
use crate::application::reconciler::{ReconcileOutcome, SnapshotReconciler};
use crate::domain::{OrderSnapshot, OrderStatus};
use crate::infrastructure::clock::Clock;
use crate::infrastructure::config::SessionSettings;
use crate::infrastructure::probe::ProbeReport;
use pushsocket::{
    ChannelEvent, ChannelEventKind, ConnectionState, FailureCause, PushSocketError,
    ReconnectionStrategy, WsMessage, NORMAL_CLOSURE,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Everything the machine reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum SessionInput {
    Start,
    ChannelOpened { generation: u64 },
    ChannelMessage { generation: u64, message: WsMessage },
    ChannelError { generation: u64, error: PushSocketError },
    ChannelClosed { generation: u64, code: Option<u16>, reason: String },
    ConnectTimeout { generation: u64 },
    ReconnectDue,
    ProjectionTick,
    ProbeCompleted(ProbeReport),
    Stop,
}

impl From<ChannelEvent> for SessionInput {
    fn from(event: ChannelEvent) -> Self {
        let generation = event.generation;
        match event.kind {
            ChannelEventKind::Opened => SessionInput::ChannelOpened { generation },
            ChannelEventKind::Message(message) => SessionInput::ChannelMessage { generation, message },
            ChannelEventKind::Error(error) => SessionInput::ChannelError { generation, error },
            ChannelEventKind::Closed { code, reason } => SessionInput::ChannelClosed {
                generation,
                code,
                reason,
            },
        }
    }
}

/// Side effects requested by the machine
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    /// Replace the live channel with a new one
    OpenChannel { generation: u64, url: String },
    /// Close and forget the live channel, if any
    CloseChannel,
    ArmConnectTimeout { generation: u64, after: Duration },
    CancelConnectTimeout,
    ScheduleReconnect { after: Duration },
    CancelReconnect,
    StartTicker { period: Duration },
    StopTicker,
    /// Run the reachability probe once, if one is configured
    StartProbe,
    Emit(SessionEvent),
}

pub struct SessionMachine {
    url: String,
    settings: SessionSettings,
    strategy: Box<dyn ReconnectionStrategy>,
    clock: Arc<dyn Clock>,
    reconciler: SnapshotReconciler,
    projector: ProgressProjector,
    state: ConnectionState,
    generation: u64,
    /// Consecutive failures since the last successful open
    failures: usize,
    ticker_running: bool,
    completion_announced: bool,
    stopped: bool,
    view: SessionView,
}

impl SessionMachine {
    pub fn new(
        order_id: impl Into<String>,
        url: impl Into<String>,
        settings: SessionSettings,
        strategy: Box<dyn ReconnectionStrategy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let url = url.into();
        Self {
            view: SessionView::new(order_id, url.clone()),
            url,
            settings,
            strategy,
            clock,
            reconciler: SnapshotReconciler::new(),
            projector: ProgressProjector::new(settings.pending_fallback_minutes),
            state: ConnectionState::Init,
            generation: 0,
            failures: 0,
            ticker_running: false,
            completion_announced: false,
            stopped: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn view(&self) -> &SessionView {
        &self.view
    }

    /// Generation of the live (or most recent) channel
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn consecutive_failures(&self) -> usize {
        self.failures
    }

    pub fn reconciler(&self) -> &SnapshotReconciler {
        &self.reconciler
    }

    /// Torn down or terminal. No input will produce actions any more.
    pub fn is_finished(&self) -> bool {
        self.stopped || self.state.is_terminal()
    }

    pub fn handle(&mut self, input: SessionInput) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        if self.stopped {
            return actions;
        }

        match input {
            SessionInput::Stop => self.teardown(&mut actions),
            SessionInput::ProbeCompleted(report) => self.on_probe(report, &mut actions),
            _ if self.state.is_terminal() => {
                debug!(order_id = %self.view.order_id, state = %self.state, "Ignoring input in terminal state");
            }
            SessionInput::Start => {
                if self.state == ConnectionState::Init {
                    self.connect(&mut actions);
                }
            }
            SessionInput::ChannelOpened { generation } => {
                if self.is_current(generation) && self.state == ConnectionState::Connecting {
                    self.on_open(&mut actions);
                }
            }
            SessionInput::ChannelMessage { generation, message } => {
                if self.is_current(generation) && self.state == ConnectionState::Open {
                    self.on_message(&message, &mut actions);
                }
            }
            SessionInput::ChannelError { generation, error } => {
                if self.is_current(generation) && self.is_live() {
                    warn!(order_id = %self.view.order_id, generation, error = %error, "Channel error");
                    self.view.last_error = Some(error.to_string());
                    self.fail(FailureCause::TransportError, &mut actions);
                }
            }
            SessionInput::ChannelClosed {
                generation,
                code,
                reason,
            } => {
                if self.is_current(generation) && self.is_live() {
                    self.on_close(code, reason, &mut actions);
                }
            }
            SessionInput::ConnectTimeout { generation } => {
                if self.is_current(generation) && self.state == ConnectionState::Connecting {
                    warn!(
                        order_id = %self.view.order_id,
                        generation,
                        timeout_secs = self.settings.connect_timeout.as_secs_f64(),
                        "Connection timed out"
                    );
                    self.view.last_error = Some("connection timed out".to_string());
                    self.fail(FailureCause::ConnectTimeout, &mut actions);
                }
            }
            SessionInput::ReconnectDue => {
                if self.state == ConnectionState::ReconnectWait {
                    self.connect(&mut actions);
                }
            }
            SessionInput::ProjectionTick => {
                if self.state == ConnectionState::Open {
                    self.reproject(&mut actions);
                }
            }
        }

        actions
    }

    fn is_current(&self, generation: u64) -> bool {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Ignoring event from detached channel");
            return false;
        }
        true
    }

    fn is_live(&self) -> bool {
        matches!(self.state, ConnectionState::Connecting | ConnectionState::Open)
    }

    fn set_state(&mut self, state: ConnectionState, actions: &mut Vec<SessionAction>) {
        if self.state == state {
            return;
        }
        debug!(order_id = %self.view.order_id, from = %self.state, to = %state, "State transition");
        self.state = state;
        self.view.connection = state;
        self.view.diagnostics.socket_state = state.as_str();
        actions.push(SessionAction::Emit(SessionEvent::StateChanged(state)));
    }

    fn connect(&mut self, actions: &mut Vec<SessionAction>) {
        if self.generation > 0 {
            actions.push(SessionAction::CloseChannel);
        }
        self.generation += 1;
        self.view.diagnostics.connection_attempts += 1;

        info!(
            order_id = %self.view.order_id,
            generation = self.generation,
            attempt = self.failures + 1,
            url = %self.url,
            "Connecting"
        );

        actions.push(SessionAction::OpenChannel {
            generation: self.generation,
            url: self.url.clone(),
        });
        actions.push(SessionAction::ArmConnectTimeout {
            generation: self.generation,
            after: self.settings.connect_timeout,
        });
        self.set_state(ConnectionState::Connecting, actions);
    }

    fn on_open(&mut self, actions: &mut Vec<SessionAction>) {
        info!(order_id = %self.view.order_id, generation = self.generation, "Channel open");
        actions.push(SessionAction::CancelConnectTimeout);
        self.failures = 0;
        self.view.last_error = None;
        self.set_state(ConnectionState::Open, actions);

        if self.view.snapshot.is_some() {
            self.reproject(actions);
            self.sync_ticker(actions);
        }
    }

    fn on_message(&mut self, message: &WsMessage, actions: &mut Vec<SessionAction>) {
        match self.reconciler.reconcile(message, self.clock.now()) {
            ReconcileOutcome::Updated {
                snapshot,
                projection_inputs_changed,
            } => self.on_snapshot(snapshot, projection_inputs_changed, actions),
            ReconcileOutcome::Unchanged | ReconcileOutcome::Dropped => {}
            ReconcileOutcome::Malformed(e) => {
                debug!(order_id = %self.view.order_id, error = %e, "Malformed frame ignored");
            }
        }
    }

    fn on_snapshot(
        &mut self,
        snapshot: OrderSnapshot,
        projection_inputs_changed: bool,
        actions: &mut Vec<SessionAction>,
    ) {
        let completed = snapshot.status == OrderStatus::Completed;
        self.view.snapshot = Some(snapshot.clone());
        actions.push(SessionAction::Emit(SessionEvent::SnapshotUpdated(Box::new(snapshot))));

        if projection_inputs_changed || self.view.projection.is_none() {
            self.reproject(actions);
        }
        self.sync_ticker(actions);

        if completed && !self.completion_announced {
            info!(order_id = %self.view.order_id, "Order completed");
            self.completion_announced = true;
            actions.push(SessionAction::Emit(SessionEvent::OrderCompleted));
        }
    }

    /// Recompute the projection, emitting only when it moved
    fn reproject(&mut self, actions: &mut Vec<SessionAction>) {
        let Some(snapshot) = self.view.snapshot.as_ref() else {
            return;
        };
        let projection = self.projector.project(snapshot, self.clock.now());
        if self.view.projection != Some(projection) {
            self.view.projection = Some(projection);
            actions.push(SessionAction::Emit(SessionEvent::ProjectionUpdated(projection)));
        }
    }

    /// Ticker runs exactly while open with an in-progress order
    fn sync_ticker(&mut self, actions: &mut Vec<SessionAction>) {
        let wanted = self.state == ConnectionState::Open
            && self
                .view
                .snapshot
                .as_ref()
                .map_or(false, ProgressProjector::advances);

        if wanted && !self.ticker_running {
            self.ticker_running = true;
            actions.push(SessionAction::StartTicker {
                period: self.settings.projection_tick,
            });
        } else if !wanted && self.ticker_running {
            self.stop_ticker(actions);
        }
    }

    fn stop_ticker(&mut self, actions: &mut Vec<SessionAction>) {
        if self.ticker_running {
            self.ticker_running = false;
            actions.push(SessionAction::StopTicker);
        }
    }

    fn on_close(&mut self, code: Option<u16>, reason: String, actions: &mut Vec<SessionAction>) {
        if code == Some(NORMAL_CLOSURE) {
            info!(order_id = %self.view.order_id, reason = %reason, "Server closed channel normally, link is invalid");
            self.view.last_error = Some("tracking link is invalid".to_string());
            self.finish(SessionFailure::InvalidLink, ConnectionState::TerminalInvalid, actions);
            return;
        }

        warn!(order_id = %self.view.order_id, ?code, reason = %reason, "Channel closed");
        self.view.last_error = Some(match code {
            Some(code) => format!("connection closed (code {})", code),
            None => "connection closed".to_string(),
        });
        self.fail(FailureCause::Closed, actions);
    }

    /// Count a failure and either retry or give up
    fn fail(&mut self, cause: FailureCause, actions: &mut Vec<SessionAction>) {
        self.failures += 1;
        let attempt = self.failures;

        actions.push(SessionAction::CancelConnectTimeout);
        self.stop_ticker(actions);
        if attempt == 1 {
            actions.push(SessionAction::StartProbe);
        }

        match self.strategy.next_delay(attempt, cause) {
            None => {
                // The failure that ends the streak follows the last reconnection
                let reconnections = attempt - 1;
                warn!(order_id = %self.view.order_id, reconnections, "Retry budget exhausted");
                self.finish(
                    SessionFailure::RetryExhausted { attempts: reconnections },
                    ConnectionState::TerminalExhausted,
                    actions,
                );
            }
            Some(delay) if delay.is_zero() => {
                info!(order_id = %self.view.order_id, attempt, ?cause, "Reconnecting immediately");
                actions.push(SessionAction::Emit(SessionEvent::Reconnecting { attempt, delay }));
                self.connect(actions);
            }
            Some(delay) => {
                info!(order_id = %self.view.order_id, attempt, ?cause, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
                actions.push(SessionAction::CloseChannel);
                actions.push(SessionAction::ScheduleReconnect { after: delay });
                self.set_state(ConnectionState::ReconnectWait, actions);
                actions.push(SessionAction::Emit(SessionEvent::Reconnecting { attempt, delay }));
            }
        }
    }

    fn finish(
        &mut self,
        failure: SessionFailure,
        state: ConnectionState,
        actions: &mut Vec<SessionAction>,
    ) {
        actions.push(SessionAction::CancelConnectTimeout);
        actions.push(SessionAction::CancelReconnect);
        self.stop_ticker(actions);
        actions.push(SessionAction::CloseChannel);

        self.view.failure = Some(failure);
        self.set_state(state, actions);
        actions.push(SessionAction::Emit(SessionEvent::Failed(failure)));
    }

    fn on_probe(&mut self, report: ProbeReport, actions: &mut Vec<SessionAction>) {
        debug!(order_id = %self.view.order_id, reachable = report.reachable, detail = %report.detail, "Probe completed");
        self.view.diagnostics.server_reachable = Some(report.reachable);
        self.view.diagnostics.probe_detail = Some(report.detail);
        actions.push(SessionAction::Emit(SessionEvent::DiagnosticsUpdated(
            self.view.diagnostics.clone(),
        )));
    }

    /// Cancel everything silently. The view keeps its last value.
    fn teardown(&mut self, actions: &mut Vec<SessionAction>) {
        info!(order_id = %self.view.order_id, state = %self.state, "Session stopped");
        self.stopped = true;
        self.ticker_running = false;
        // Bump so nothing the old channel still delivers matches
        self.generation += 1;
        actions.extend([
            SessionAction::CancelConnectTimeout,
            SessionAction::CancelReconnect,
            SessionAction::StopTicker,
            SessionAction::CloseChannel,
        ]);
    }
}
