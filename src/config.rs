//! Configuration loading and management
//!
//! Handles parsing of `command-center.toml`. Every field has a default, so a
//! missing file (or a missing table) yields a working configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::lock::DEFAULT_LOCK_TIMEOUT_MS;

/// File name looked up inside the data directory
pub const CONFIG_FILE: &str = "command-center.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Task store configuration
    #[serde(default)]
    pub tasks: TasksConfig,

    /// External log / activity configuration
    #[serde(default)]
    pub activity: ActivityConfig,

    /// Lock configuration
    #[serde(default)]
    pub locks: LockConfig,
}

/// Tasks configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TasksConfig {
    /// Status given to tasks created without one
    #[serde(default = "default_task_status")]
    pub default_status: String,
}

fn default_task_status() -> String {
    "not_started".to_string()
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            default_status: default_task_status(),
        }
    }
}

/// Where the external process writes its logs, and what counts as activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivityConfig {
    /// Directory scanned for log files
    #[serde(default = "default_activity_dir")]
    pub dir: PathBuf,

    /// Glob matched against file names inside `dir`
    #[serde(default = "default_activity_pattern")]
    pub pattern: String,

    /// Substrings that mark a log line as activity
    #[serde(default = "default_activity_markers")]
    pub markers: Vec<String>,

    /// Maximum number of activity lines returned
    #[serde(default = "default_activity_limit")]
    pub limit: usize,
}

fn default_activity_dir() -> PathBuf {
    PathBuf::from("/tmp/openclaw")
}

fn default_activity_pattern() -> String {
    "openclaw-*.log".to_string()
}

fn default_activity_markers() -> Vec<String> {
    [
        "[heartbeat]",
        "[cron]",
        "[gateway]",
        "[telegram]",
        "[whatsapp]",
        "[security]",
        "[ws]",
        "[diagnostic]",
        "Error:",
        "WARNING",
    ]
    .iter()
    .map(|marker| marker.to_string())
    .collect()
}

fn default_activity_limit() -> usize {
    250
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            dir: default_activity_dir(),
            pattern: default_activity_pattern(),
            markers: default_activity_markers(),
            limit: default_activity_limit(),
        }
    }
}

/// Lock configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long a store waits for its file lock
    #[serde(default = "default_lock_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout_ms(),
        }
    }
}

impl Config {
    /// Load and validate configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`, or fall back to defaults
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config");
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        self.tasks.validate()?;
        self.activity.validate()?;
        if self.locks.timeout_ms == 0 {
            return Err(Error::InvalidConfig(
                "locks.timeout_ms must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl TasksConfig {
    fn validate(&self) -> Result<()> {
        if self.default_status.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "tasks.default_status cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl ActivityConfig {
    fn validate(&self) -> Result<()> {
        if self.pattern.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "activity.pattern cannot be empty".to_string(),
            ));
        }
        glob::Pattern::new(&self.pattern).map_err(|err| {
            Error::InvalidConfig(format!(
                "activity.pattern: invalid glob pattern '{}': {err}",
                self.pattern
            ))
        })?;
        if self.markers.iter().any(|marker| marker.is_empty()) {
            return Err(Error::InvalidConfig(
                "activity.markers cannot include empty entries".to_string(),
            ));
        }
        if self.limit == 0 {
            return Err(Error::InvalidConfig(
                "activity.limit must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}
