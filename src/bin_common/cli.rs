//! CLI utilities for binaries
//!
//! Handles configuration paths and command line arguments.

use std::path::PathBuf;

/// Type of configuration to load
#[derive(Debug, Clone)]
pub enum ConfigType {
    /// Tracker configuration (config/tracker.yaml)
    Tracker,
    /// Custom path
    Custom(String),
}

impl ConfigType {
    /// Get the default path for this config type
    pub fn default_path(&self) -> &str {
        match self {
            ConfigType::Tracker => "config/tracker.yaml",
            ConfigType::Custom(path) => path,
        }
    }

    /// Get the environment variable name for this config type
    pub fn env_var_name(&self) -> &str {
        match self {
            ConfigType::Tracker => "TRACKER_CONFIG_PATH",
            ConfigType::Custom(_) => "TRACKER_CONFIG_PATH",
        }
    }
}

/// Load configuration path from environment or use default
///
/// # Examples
/// ```
/// use order_tracker::bin_common::{load_config_from_env, ConfigType};
///
/// let path = load_config_from_env(ConfigType::Tracker);
/// ```
pub fn load_config_from_env(config_type: ConfigType) -> PathBuf {
    std::env::var(config_type.env_var_name())
        .unwrap_or_else(|_| config_type.default_path().to_string())
        .into()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}

/// Arguments of `track-order`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackArgs {
    /// Tracking link or bare order id
    pub target: String,
    pub config: Option<String>,
}

impl TrackArgs {
    /// `track-order <link-or-id> [--config <path>]`
    pub fn parse(args: &[String]) -> Result<Self, String> {
        let mut target = None;
        let mut config = None;
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--config" | "-c" => {
                    let path = iter
                        .next()
                        .ok_or_else(|| format!("{} needs a path", arg))?;
                    config = Some(path.clone());
                }
                other if other.starts_with('-') => {
                    return Err(format!("unknown option {}", other));
                }
                other => {
                    if target.replace(other.to_string()).is_some() {
                        return Err("only one tracking link or order id is accepted".to_string());
                    }
                }
            }
        }

        let target = target.ok_or_else(|| "missing tracking link or order id".to_string())?;
        Ok(Self { target, config })
    }

    /// Whether the target is a full link rather than a bare id
    pub fn is_link(&self) -> bool {
        self.target.contains("://")
    }
}

pub fn usage() -> &'static str {
    "usage: track-order <tracking-link-or-order-id> [--config <path>]"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_config_type_paths() {
        assert_eq!(ConfigType::Tracker.default_path(), "config/tracker.yaml");

        let custom = ConfigType::Custom("custom/path.yaml".to_string());
        assert_eq!(custom.default_path(), "custom/path.yaml");
    }

    #[test]
    fn test_config_type_env_vars() {
        assert_eq!(ConfigType::Tracker.env_var_name(), "TRACKER_CONFIG_PATH");
    }

    #[test]
    fn test_parse_link_with_config() {
        let parsed = TrackArgs::parse(&args(&[
            "https://tracking.example.kg/track/42",
            "--config",
            "local.yaml",
        ]))
        .unwrap();
        assert_eq!(parsed.target, "https://tracking.example.kg/track/42");
        assert_eq!(parsed.config.as_deref(), Some("local.yaml"));
        assert!(parsed.is_link());
    }

    #[test]
    fn test_parse_bare_id() {
        let parsed = TrackArgs::parse(&args(&["42"])).unwrap();
        assert!(!parsed.is_link());
        assert_eq!(parsed.config, None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(TrackArgs::parse(&[]).is_err());
        assert!(TrackArgs::parse(&args(&["1", "2"])).is_err());
        assert!(TrackArgs::parse(&args(&["1", "--config"])).is_err());
        assert!(TrackArgs::parse(&args(&["--verbose"])).is_err());
    }
}
