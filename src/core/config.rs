//! Bootstrap configuration
//!
//! Configuration is read once, before any backend exists, from a flat
//! property map or a JSON document. Only the keys listed in
//! [`property_keys`] are recognized; everything else is ignored.

use super::error::{BootstrapError, Result};
use super::level::Level;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Recognized property keys
pub mod property_keys {
    /// Provider-discovery failure policy: `error`, `warn`, `warn-verbose`, `silent`
    pub const FAIL_POLICY: &str = "logger.finder.error";
    /// Reject more than one custom provider: `true` / `false`
    pub const SINGLETON: &str = "logger.finder.singleton";
    /// Console format template
    pub const FORMAT: &str = "system.logger.format";
    /// Default console threshold
    pub const LEVEL: &str = "system.logger.level";
    /// Comma separated caller-frame prefixes treated as internal
    pub const SKIP_PREFIXES: &str = "system.logger.skip-prefixes";
    /// Backend configuration file; its presence marks the backend configured
    pub const BACKEND_CONFIG_FILE: &str = "logging.config.file";
    /// Backend configuration class; its presence marks the backend configured
    pub const BACKEND_CONFIG_CLASS: &str = "logging.config.class";
    /// Replay worker idle timeout in seconds
    pub const IDLE_TIMEOUT: &str = "bootstrap.idle-timeout";
}

/// What to do when a logger finder provider cannot be loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailPolicy {
    /// Return the failure as a fatal configuration error
    Error,
    /// Print a warning and fall back to the console
    #[default]
    Warn,
    /// Print a warning with the failure detail and fall back to the console
    WarnVerbose,
    /// Fall back to the console silently
    Silent,
}

impl fmt::Display for FailPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailPolicy::Error => write!(f, "error"),
            FailPolicy::Warn => write!(f, "warn"),
            FailPolicy::WarnVerbose => write!(f, "warn-verbose"),
            FailPolicy::Silent => write!(f, "silent"),
        }
    }
}

impl FromStr for FailPolicy {
    type Err = BootstrapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "error" => Ok(FailPolicy::Error),
            "warn" | "warning" => Ok(FailPolicy::Warn),
            "warn-verbose" | "debug" => Ok(FailPolicy::WarnVerbose),
            "silent" | "quiet" => Ok(FailPolicy::Silent),
            other => Err(BootstrapError::config(
                property_keys::FAIL_POLICY,
                format!("unknown policy '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    pub fail_policy: FailPolicy,
    pub singleton: bool,
    /// Console format template, `None` for the built-in one
    pub format: Option<String>,
    pub default_level: Level,
    pub skip_prefixes: Vec<String>,
    /// Recognized backend configuration source, if one is set
    pub backend_config: Option<String>,
    pub idle_timeout_secs: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            fail_policy: FailPolicy::Warn,
            singleton: false,
            format: None,
            default_level: Level::Info,
            skip_prefixes: vec![format!("{}::", env!("CARGO_CRATE_NAME"))],
            backend_config: None,
            idle_timeout_secs: 30,
        }
    }
}

impl BootstrapConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a configuration from a flat property map
    ///
    /// # Example
    ///
    /// ```
    /// use rust_bootstrap_logger::{BootstrapConfig, FailPolicy};
    /// use std::collections::HashMap;
    ///
    /// let mut props = HashMap::new();
    /// props.insert("logger.finder.error".to_string(), "silent".to_string());
    /// props.insert("logging.config.file".to_string(), "/etc/app/logging.json".to_string());
    ///
    /// let config = BootstrapConfig::from_properties(&props).unwrap();
    /// assert_eq!(config.fail_policy, FailPolicy::Silent);
    /// assert!(config.has_backend_config());
    /// ```
    pub fn from_properties(props: &HashMap<String, String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(value) = props.get(property_keys::FAIL_POLICY) {
            config.fail_policy = value.parse()?;
        }
        if let Some(value) = props.get(property_keys::SINGLETON) {
            config.singleton = parse_bool(property_keys::SINGLETON, value)?;
        }
        if let Some(value) = props.get(property_keys::FORMAT) {
            config.format = Some(value.clone());
        }
        if let Some(value) = props.get(property_keys::LEVEL) {
            config.default_level = value
                .parse()
                .map_err(|e: String| BootstrapError::config(property_keys::LEVEL, e))?;
        }
        if let Some(value) = props.get(property_keys::SKIP_PREFIXES) {
            config.skip_prefixes = value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        config.backend_config = props
            .get(property_keys::BACKEND_CONFIG_CLASS)
            .or_else(|| props.get(property_keys::BACKEND_CONFIG_FILE))
            .cloned();
        if let Some(value) = props.get(property_keys::IDLE_TIMEOUT) {
            config.idle_timeout_secs = value.trim().parse().map_err(|_| {
                BootstrapError::config(
                    property_keys::IDLE_TIMEOUT,
                    format!("'{}' is not a number of seconds", value),
                )
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Returns true if a recognized backend configuration source is set
    pub fn has_backend_config(&self) -> bool {
        self.backend_config.is_some()
    }

    pub fn validate(&self) -> Result<()> {
        if self.idle_timeout_secs == 0 {
            return Err(BootstrapError::config(
                "idle_timeout_secs",
                "idle timeout must be at least one second",
            ));
        }
        if matches!(self.default_level, Level::All) {
            return Err(BootstrapError::config(
                "default_level",
                "ALL is not a valid default threshold, use TRACE",
            ));
        }
        Ok(())
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "on" | "yes" | "1" => Ok(true),
        "false" | "off" | "no" | "0" => Ok(false),
        other => Err(BootstrapError::config(
            key,
            format!("'{}' is not a boolean", other),
        )),
    }
}
