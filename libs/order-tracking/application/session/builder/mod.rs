pub mod states;

use super::machine::SessionMachine;
use super::TrackingSession;
use crate::error::{Result, TrackerError};
use crate::infrastructure::clock::{Clock, SystemClock};
use crate::infrastructure::config::{SessionSettings, TrackerConfig};
use crate::infrastructure::endpoint::Endpoint;
use crate::infrastructure::probe::{HttpProbe, ReachabilityProbe};
use crate::infrastructure::resolver::{ExplicitId, OrderIdResolver};
use pushsocket::{FixedDelay, ReconnectionStrategy};
use states::*;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{info, warn};

/// Type-state builder for [`TrackingSession`]
///
/// `start` only exists once a resolver (or explicit order id) is set.
pub struct SessionBuilder<R: ResolverState> {
    _state: PhantomData<R>,
    resolver: Option<Box<dyn OrderIdResolver>>,
    settings: SessionSettings,
    endpoint: Option<Endpoint>,
    clock: Arc<dyn Clock>,
    probe: Option<Arc<dyn ReachabilityProbe>>,
    http_probe: bool,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
}

impl SessionBuilder<NoResolver> {
    pub fn new() -> Self {
        Self {
            _state: PhantomData,
            resolver: None,
            settings: SessionSettings::default(),
            endpoint: None,
            clock: Arc::new(SystemClock),
            probe: None,
            http_probe: false,
            reconnect_strategy: None,
        }
    }

    pub fn resolver(self, resolver: impl OrderIdResolver + 'static) -> SessionBuilder<HasResolver> {
        SessionBuilder {
            _state: PhantomData,
            resolver: Some(Box::new(resolver)),
            settings: self.settings,
            endpoint: self.endpoint,
            clock: self.clock,
            probe: self.probe,
            http_probe: self.http_probe,
            reconnect_strategy: self.reconnect_strategy,
        }
    }

    /// Track an id known up front
    pub fn order_id(self, order_id: impl Into<String>) -> SessionBuilder<HasResolver> {
        self.resolver(ExplicitId(order_id.into()))
    }
}

impl Default for SessionBuilder<NoResolver> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ResolverState> SessionBuilder<R> {
    /// Take timings, endpoint and probe preference from a loaded config
    pub fn config(mut self, config: &TrackerConfig) -> Self {
        self.settings = config.session_settings();
        self.endpoint = Some(Endpoint::from_config(config));
        self.http_probe = config.probe_enabled;
        self
    }

    pub fn settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn endpoint(mut self, endpoint: Endpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Custom reachability probe, replacing the HTTP one
    pub fn probe(mut self, probe: Arc<dyn ReachabilityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Replace the fixed-delay policy derived from the settings
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }
}

impl SessionBuilder<HasResolver> {
    /// Resolve the order id and assemble the state machine without running it
    pub fn build_machine(&mut self) -> Result<SessionMachine> {
        let order_id = self
            .resolver
            .as_ref()
            .and_then(|resolver| resolver.resolve())
            .ok_or_else(|| TrackerError::Configuration("no order id in tracking link".to_string()))?;

        let endpoint = self.endpoint_or_default();
        let url = endpoint.channel_url(&order_id)?;

        let settings = self.settings;
        let strategy = self.reconnect_strategy.take().unwrap_or_else(|| {
            Box::new(FixedDelay::new(
                settings.reconnect_delay,
                Some(settings.max_attempts),
            ))
        });

        Ok(SessionMachine::new(
            order_id,
            url,
            settings,
            strategy,
            Arc::clone(&self.clock),
        ))
    }

    /// Start the session on the current Tokio runtime
    ///
    /// Fails with [`TrackerError::Configuration`] when no order id can be
    /// resolved; no connection is attempted in that case.
    pub fn start(mut self) -> Result<TrackingSession> {
        let machine = self.build_machine()?;
        let probe = self.probe.take().or_else(|| self.http_probe());

        info!(
            order_id = %machine.view().order_id,
            url = %machine.view().diagnostics.ws_url,
            "Starting tracking session"
        );

        Ok(TrackingSession::spawn(machine, probe))
    }

    fn endpoint_or_default(&self) -> Endpoint {
        self.endpoint
            .clone()
            .unwrap_or_else(|| Endpoint::from_config(&TrackerConfig::default()))
    }

    fn http_probe(&self) -> Option<Arc<dyn ReachabilityProbe>> {
        if !self.http_probe {
            return None;
        }
        let base = match self.endpoint_or_default().http_base() {
            Ok(base) => base,
            Err(e) => {
                warn!(error = %e, "Probe disabled");
                return None;
            }
        };
        match HttpProbe::new(base) {
            Ok(probe) => Some(Arc::new(probe)),
            Err(e) => {
                warn!(error = %e, "Probe disabled");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pushsocket::ConnectionState;

    #[test]
    fn test_missing_id_is_configuration_error() {
        let mut builder = TrackingSession::builder().resolver(|| None::<String>);
        assert!(matches!(
            builder.build_machine(),
            Err(TrackerError::Configuration(_))
        ));
    }

    #[test]
    fn test_start_without_id_attempts_nothing() {
        // No runtime is needed because start fails before spawning
        let result = TrackingSession::builder().order_id("   ").start();
        assert!(matches!(result, Err(TrackerError::Configuration(_))));
    }

    #[test]
    fn test_machine_uses_config_endpoint() {
        let config = TrackerConfig {
            host: "127.0.0.1:9000".to_string(),
            secure: false,
            ..TrackerConfig::default()
        };
        let machine = TrackingSession::builder()
            .order_id("77")
            .config(&config)
            .build_machine()
            .unwrap();

        assert_eq!(machine.view().order_id, "77");
        assert_eq!(machine.view().diagnostics.ws_url, "ws://127.0.0.1:9000/ws/order/77/");
        assert_eq!(machine.state(), ConnectionState::Init);
    }
}
