//! Activity extraction from an external process's log files.
//!
//! The watched process writes logs named like `openclaw-<date>.log` into a
//! well-known directory. We pick the most recently modified one and either
//! tail it verbatim or keep only lines carrying an interest marker.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::config::ActivityConfig;
use crate::error::{Error, Result};

pub const DEFAULT_LOG_LINES: usize = 200;
pub const MIN_LOG_LINES: usize = 10;
pub const MAX_LOG_LINES: usize = 5000;

/// Clamp a requested log tail size to `[MIN_LOG_LINES, MAX_LOG_LINES]`.
pub fn clamp_log_lines(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_LOG_LINES)
        .clamp(MIN_LOG_LINES, MAX_LOG_LINES)
}

/// The raw tail of the newest log file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogTail {
    pub path: PathBuf,
    pub lines: String,
}

/// Marker-filtered lines from the newest log file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivityFeed {
    pub path: PathBuf,
    pub items: Vec<String>,
}

fn split_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
}

/// The last `n` lines of `text`, joined with `\n`.
///
/// A trailing newline counts as an empty final line, so the tail of a
/// newline-terminated file ends with `\n`.
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = split_lines(text).collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

/// Lines containing at least one marker, keeping the last `limit`.
pub fn extract_activity(text: &str, markers: &[String], limit: usize) -> Vec<String> {
    let matches: Vec<&str> = split_lines(text)
        .filter(|line| markers.iter().any(|marker| line.contains(marker.as_str())))
        .collect();
    let start = matches.len().saturating_sub(limit);
    matches[start..].iter().map(|line| line.to_string()).collect()
}

/// Locates and reads the external log
#[derive(Debug, Clone)]
pub struct ActivitySource {
    config: ActivityConfig,
    pattern: glob::Pattern,
}

impl ActivitySource {
    pub fn new(config: ActivityConfig) -> Result<Self> {
        let pattern = glob::Pattern::new(&config.pattern).map_err(|err| {
            Error::InvalidConfig(format!(
                "activity.pattern: invalid glob pattern '{}': {err}",
                config.pattern
            ))
        })?;
        Ok(Self { config, pattern })
    }

    /// The matching file with the newest modification time, if any.
    pub fn latest_log_file(&self) -> Option<PathBuf> {
        let entries = match fs::read_dir(&self.config.dir) {
            Ok(entries) => entries,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::warn!(dir = %self.config.dir.display(), error = %err, "cannot scan log directory");
                }
                return None;
            }
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(|name| self.pattern.matches(name))
                    .unwrap_or(false)
            })
            .filter_map(|entry| {
                let metadata = entry.metadata().ok()?;
                if !metadata.is_file() {
                    return None;
                }
                let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                Some((modified, entry.path()))
            })
            .max()
            .map(|(_, path)| path)
    }

    /// Tail of the newest log, `lines` clamped to the allowed range.
    pub fn read_logs(&self, lines: usize) -> Result<LogTail> {
        let lines = clamp_log_lines(Some(lines));
        let path = self.latest_log_file().ok_or_else(|| {
            Error::NotAvailable(format!(
                "No log found in {}",
                self.config.dir.display()
            ))
        })?;
        let raw = read_lossy(&path)?;
        Ok(LogTail {
            lines: tail_lines(&raw, lines),
            path,
        })
    }

    /// Activity lines from the newest log, up to `limit` (or the configured
    /// default).
    pub fn read_activity(&self, limit: Option<usize>) -> Result<ActivityFeed> {
        let path = self
            .latest_log_file()
            .ok_or_else(|| Error::NotAvailable("No log found".to_string()))?;
        let raw = read_lossy(&path)?;
        let limit = limit.unwrap_or(self.config.limit);
        Ok(ActivityFeed {
            items: extract_activity(&raw, &self.config.markers, limit),
            path,
        })
    }
}

fn read_lossy(path: &Path) -> Result<String> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Err(Error::NotAvailable(format!(
            "Log disappeared: {}",
            path.display()
        ))),
        Err(err) => Err(Error::Io(err)),
    }
}
