//! Storage layer for command-center
//!
//! All persistent state lives in one data directory:
//!
//! ```text
//! <data-dir>/
//!   command-center.toml     # Optional configuration
//!   tasks.json              # { "tasks": [...] }, rewritten on every upsert
//!   tasks.json.lock         # Guards the task read-modify-write
//!   events.jsonl            # One event per line, append-only
//!   events.jsonl.lock       # Guards appends
//! ```

use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};

use crate::config::CONFIG_FILE;
use crate::error::Result;
use crate::lock;

const TASKS_FILE: &str = "tasks.json";
const EVENTS_FILE: &str = "events.jsonl";

/// Storage manager for the data directory
#[derive(Debug, Clone)]
pub struct Storage {
    data_dir: PathBuf,
}

impl Storage {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path to the task document
    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_FILE)
    }

    /// Path to the event log (JSONL format)
    pub fn events_file(&self) -> PathBuf {
        self.data_dir.join(EVENTS_FILE)
    }

    /// Default location of the configuration file
    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Create the data directory if needed
    pub fn init(&self) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    // =========================================================================
    // File I/O helpers
    // =========================================================================

    /// Write JSON atomically (temp file + rename), pretty-printed
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read and parse a JSON document
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Append one record as a JSON line.
    ///
    /// Not atomic across processes on its own; callers hold the log's lock.
    pub fn append_jsonl<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        file.write_all(&line)?;
        file.flush()?;

        Ok(())
    }

    /// The last `limit` non-blank lines of a text file, oldest first.
    ///
    /// Only `limit` lines are held in memory. Invalid UTF-8 is replaced
    /// rather than failing the read. A missing file yields no lines.
    pub fn read_tail_lines(&self, path: &Path, limit: usize) -> Result<Vec<String>> {
        if limit == 0 || !path.exists() {
            return Ok(Vec::new());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut tail: VecDeque<String> = VecDeque::with_capacity(limit);
        for chunk in reader.split(b'\n') {
            let chunk = chunk?;
            let line = String::from_utf8_lossy(&chunk);
            let line = line.strip_suffix('\r').unwrap_or(&line);
            if line.trim().is_empty() {
                continue;
            }
            if tail.len() == limit {
                tail.pop_front();
            }
            tail.push_back(line.to_string());
        }

        Ok(tail.into())
    }
}
