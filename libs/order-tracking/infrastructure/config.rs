use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config file: {0}")]
    FileError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Backend host serving the push channel, without scheme
    pub host: String,
    /// Use `wss://` and `https://`
    pub secure: bool,
    pub connect_timeout_secs: u64,
    /// Delay before reconnecting after a close or transport error
    pub reconnect_delay_secs: u64,
    /// Consecutive failures tolerated before giving up
    pub max_reconnect_attempts: usize,
    /// Local projection refresh period while the order is in progress
    pub projection_tick_secs: u64,
    /// Remaining time shown for pending orders without an estimate
    pub pending_fallback_minutes: u32,
    /// Run the HTTP reachability probe for diagnostics
    pub probe_enabled: bool,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            host: "tracking.belektech.kg".to_string(),
            secure: true,
            connect_timeout_secs: 15,
            reconnect_delay_secs: 3,
            max_reconnect_attempts: 5,
            projection_tick_secs: 60,
            pending_fallback_minutes: 90,
            probe_enabled: true,
            log_level: "info".to_string(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from YAML file
    pub fn load(config_path: impl AsRef<Path>) -> Result<Self> {
        let yaml_content = std::fs::read_to_string(config_path)?;
        let mut config: TrackerConfig = serde_yaml::from_str(&yaml_content)?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults
    pub fn load_or_default(config_path: impl AsRef<Path>) -> Result<Self> {
        let path = config_path.as_ref();
        if path.exists() {
            return Self::load(path);
        }

        warn!("Config file {} not found, using defaults", path.display());
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// `TRACKER_HOST` and `TRACKER_SECURE` take precedence over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("TRACKER_HOST") {
            info!("Overriding host from environment variable");
            self.host = host;
        }
        if let Ok(secure) = std::env::var("TRACKER_SECURE") {
            match secure.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => self.secure = true,
                "0" | "false" | "no" => self.secure = false,
                other => warn!("Ignoring TRACKER_SECURE={}, expected true or false", other),
            }
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let host = self.host.trim();
        if host.is_empty() {
            return Err(ConfigError::ValidationError("host must not be empty".to_string()));
        }
        if host.contains("://") || host.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "host must be a bare host[:port], got {}",
                host
            )));
        }

        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "connect_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_reconnect_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "max_reconnect_attempts must be greater than 0".to_string(),
            ));
        }

        if self.projection_tick_secs == 0 {
            return Err(ConfigError::ValidationError(
                "projection_tick_secs must be greater than 0".to_string(),
            ));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "log_level must be one of: {}",
                valid_levels.join(", ")
            )));
        }

        Ok(())
    }

    /// Log configuration summary
    pub fn log(&self) {
        info!("Configuration loaded:");
        info!("  Host: {} (secure: {})", self.host, self.secure);
        info!("  Connect timeout: {} seconds", self.connect_timeout_secs);
        info!(
            "  Reconnect: {} attempts, {} seconds apart",
            self.max_reconnect_attempts, self.reconnect_delay_secs
        );
        info!("  Projection tick: {} seconds", self.projection_tick_secs);
        info!("  Pending fallback: {} minutes", self.pending_fallback_minutes);
        info!("  Probe enabled: {}", self.probe_enabled);
        info!("  Log level: {}", self.log_level);
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            reconnect_delay: Duration::from_secs(self.reconnect_delay_secs),
            max_attempts: self.max_reconnect_attempts,
            projection_tick: Duration::from_secs(self.projection_tick_secs),
            pending_fallback_minutes: self.pending_fallback_minutes,
        }
    }
}

/// Timing and budget of one tracking session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    pub connect_timeout: Duration,
    pub reconnect_delay: Duration,
    pub max_attempts: usize,
    pub projection_tick: Duration,
    pub pending_fallback_minutes: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        TrackerConfig::default().session_settings()
    }
}

impl SessionSettings {
    pub fn with_connect_timeout_ms(mut self, ms: u64) -> Self {
        self.connect_timeout = Duration::from_millis(ms);
        self
    }

    pub fn with_reconnect_delay_ms(mut self, ms: u64) -> Self {
        self.reconnect_delay = Duration::from_millis(ms);
        self
    }

    pub fn with_projection_tick_ms(mut self, ms: u64) -> Self {
        self.projection_tick = Duration::from_millis(ms);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }
}
