//! Configuration for the monitor.
//!
//! Supports YAML configuration with precedence: CLI > file > defaults.

use crate::monitor::aggregator::AggregatorOptions;
use crate::monitor::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Refresh interval in milliseconds.
    #[serde(default = "default_update_ms")]
    pub update_ms: u64,

    /// Number of processes shown.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Width of the command column.
    #[serde(default = "default_command_width")]
    pub command_width: usize,

    /// Colour data rows.
    #[serde(default = "default_color")]
    pub color: bool,

    /// Upper bound for resolving one process, in milliseconds.
    #[serde(default = "default_resolve_timeout_ms")]
    pub resolve_timeout_ms: u64,

    /// Consecutive resolution failures before a pid is hidden (0 = never).
    #[serde(default = "default_stale_after")]
    pub stale_after: u32,

    /// Print the system memory line under the table.
    #[serde(default = "default_show_memory_summary")]
    pub show_memory_summary: bool,
}

fn default_update_ms() -> u64 {
    1000
}
fn default_top_k() -> usize {
    10
}
fn default_command_width() -> usize {
    40
}
fn default_color() -> bool {
    true
}
fn default_resolve_timeout_ms() -> u64 {
    500
}
fn default_stale_after() -> u32 {
    3
}
fn default_show_memory_summary() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            update_ms: default_update_ms(),
            top_k: default_top_k(),
            command_width: default_command_width(),
            color: default_color(),
            resolve_timeout_ms: default_resolve_timeout_ms(),
            stale_after: default_stale_after(),
            show_memory_summary: default_show_memory_summary(),
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("faulttop/config.yaml"))
    }

    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .map_err(|_| MonitorError::ConfigNotFound(path.display().to_string()))?;

        Self::parse(&content)
    }

    /// Parses configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error with line number if parsing fails, or if a value is
    /// out of range.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(yaml).map_err(|e| {
            let line = e.location().map_or(0, |l| l.line());
            MonitorError::ConfigParse { line, message: e.to_string() }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with fallback to defaults.
    #[must_use]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Rejects values the tick loop cannot work with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("update_ms", self.update_ms == 0),
            ("top_k", self.top_k == 0),
            ("command_width", self.command_width == 0),
            ("resolve_timeout_ms", self.resolve_timeout_ms == 0),
        ];
        for (key, is_zero) in positive {
            if is_zero {
                return Err(MonitorError::ConfigInvalid {
                    key: key.to_string(),
                    message: "must be positive".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the update interval as a Duration.
    #[must_use]
    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_ms)
    }

    /// Builds aggregator options for the current process.
    #[must_use]
    pub fn aggregator_options(&self) -> AggregatorOptions {
        AggregatorOptions {
            top_k: self.top_k,
            command_width: self.command_width,
            resolve_timeout: Some(Duration::from_millis(self.resolve_timeout_ms)),
            stale_after: self.stale_after,
            self_pid: std::process::id(),
        }
    }
}
