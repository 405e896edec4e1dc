use anyhow::{Context, Result};
use order_tracker::bin_common::display::{diagnostics_lines, order_details, status_line};
use order_tracker::bin_common::{
    load_config_from_env, parse_args, usage, BinaryRunner, ConfigType, RunConfig, TrackArgs,
};
use order_tracking::{
    init_tracing, LocationResolver, SessionEvent, TrackerConfig, TrackingSession,
};
use std::path::PathBuf;
use tracing::{error, info, warn};

struct TrackOrderApp {
    run_config: RunConfig,
    config: TrackerConfig,
    args: TrackArgs,
    updates: usize,
    outcome: Option<String>,
}

impl TrackOrderApp {
    fn resolver(&self) -> LocationResolver {
        if self.args.is_link() {
            LocationResolver::new(self.args.target.clone())
        } else {
            LocationResolver::default().with_explicit(self.args.target.clone())
        }
    }

    /// Handle everything queued so far. Returns false once nothing more will happen.
    fn drain_events(&mut self, session: &TrackingSession) -> bool {
        while let Some(event) = session.try_recv_event() {
            if !self.handle_event(session, event) {
                return false;
            }
        }
        true
    }

    /// Returns false once nothing more will happen
    fn handle_event(&mut self, session: &TrackingSession, event: SessionEvent) -> bool {
        match event {
            SessionEvent::StateChanged(state) => {
                info!("Connection: {}", state);
            }
            SessionEvent::SnapshotUpdated(snapshot) => {
                if self.updates == 0 {
                    for line in order_details(&snapshot) {
                        info!("{}", line);
                    }
                }
                self.updates += 1;
                info!("{}", status_line(&snapshot, session.view().projection));
            }
            SessionEvent::ProjectionUpdated(_) => {
                if let Some(snapshot) = session.view().snapshot {
                    info!("{}", status_line(&snapshot, session.view().projection));
                }
            }
            SessionEvent::Reconnecting { attempt, delay } => {
                warn!("Reconnecting... (attempt {}, in {:?})", attempt, delay);
            }
            SessionEvent::OrderCompleted => {
                info!("Your car is ready! Please pick it up.");
            }
            SessionEvent::Failed(failure) => {
                error!("{}", failure.user_message());
                for line in diagnostics_lines(&session.view()) {
                    info!("  {}", line);
                }
                self.outcome = Some(failure.to_string());
                return false;
            }
            SessionEvent::DiagnosticsUpdated(diagnostics) => {
                info!(
                    "Server reachable: {}",
                    diagnostics.server_reachable.unwrap_or(false)
                );
            }
        }
        true
    }
}

impl BinaryRunner for TrackOrderApp {
    async fn run(&mut self) -> Result<()> {
        let session = TrackingSession::builder()
            .resolver(self.resolver())
            .config(&self.config)
            .start()
            .context("could not start tracking session")?;

        info!("Tracking order {}", session.order_id());

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        'outer: loop {
            tokio::select! {
                _ = &mut ctrl_c => {
                    info!("Ctrl+C received, stopping");
                    break;
                }
                _ = tokio::time::sleep(self.run_config.poll_interval) => {
                    // State is published before the events that explain it
                    let finished = session.is_finished();
                    if !self.drain_events(&session) || finished {
                        break 'outer;
                    }
                }
            }
        }

        session.stop().await;
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn summary(&self) -> Option<String> {
        Some(match &self.outcome {
            Some(outcome) => format!("Updates received: {} ({})", self.updates, outcome),
            None => format!("Updates received: {}", self.updates),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let args = match TrackArgs::parse(&parse_args()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n{}", e, usage());
            std::process::exit(2);
        }
    };

    // Load config first (before logging is initialized)
    let config_path = match &args.config {
        Some(path) => PathBuf::from(path),
        None => load_config_from_env(ConfigType::Tracker),
    };
    let config = TrackerConfig::load_or_default(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    init_tracing(&config.log_level);
    config.log();

    let mut app = TrackOrderApp {
        run_config: RunConfig::new("Order Tracker"),
        config,
        args,
        updates: 0,
        outcome: None,
    };

    app.execute().await
}
