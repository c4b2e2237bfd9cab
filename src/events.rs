//! Append-only event log.
//!
//! Events are stored one JSON object per line in `events.jsonl`. Reads only
//! ever look at a bounded suffix of the file.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::lock::{lock_path_for, FileLock};
use crate::storage::Storage;

/// Event type recorded for every task upsert
pub const TASK_UPSERT: &str = "task.upsert";

/// Event type recorded when the HTTP server starts listening
pub const SERVER_START: &str = "server.start";

pub const DEFAULT_TAIL_LIMIT: usize = 200;
pub const MIN_TAIL_LIMIT: usize = 10;
pub const MAX_TAIL_LIMIT: usize = 2000;

const RESERVED_FIELDS: [&str; 3] = ["ts", "type", "detail"];

/// A stored event: `{ ts, type, detail?, ...extra }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(with = "crate::clock::wire")]
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: String,
    /// `Some(Value::Null)` is kept distinct from an absent detail.
    #[serde(
        default,
        deserialize_with = "present_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub detail: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn present_value<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// An event before it is timestamped and written.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub kind: String,
    pub detail: Option<Value>,
    pub extra: Map<String, Value>,
}

impl EventDraft {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    /// Attach an extra top-level field. Reserved names are ignored.
    pub fn with_field<T: Serialize>(mut self, key: impl Into<String>, value: T) -> Result<Self> {
        let key = key.into();
        if RESERVED_FIELDS.contains(&key.as_str()) {
            tracing::debug!(%key, "ignoring reserved event field");
            return Ok(self);
        }
        self.extra.insert(key, serde_json::to_value(value)?);
        Ok(self)
    }

    /// Build a draft from a `POST /api/events` body.
    ///
    /// `type` may be a string or a scalar that is rendered as one; detail
    /// defaults to `null` so it is always present on client events.
    pub fn from_body(body: &Value) -> Result<Self> {
        let kind = match body.get("type") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
            Some(Value::Bool(true)) => "true".to_string(),
            _ => String::new(),
        };
        if kind.is_empty() {
            return Err(Error::Validation("Missing type".to_string()));
        }
        let detail = body.get("detail").cloned().unwrap_or(Value::Null);
        Ok(Self::new(kind).with_detail(detail))
    }
}

/// Clamp a requested tail size to `[MIN_TAIL_LIMIT, MAX_TAIL_LIMIT]`.
pub fn clamp_limit(requested: Option<usize>) -> usize {
    requested
        .unwrap_or(DEFAULT_TAIL_LIMIT)
        .clamp(MIN_TAIL_LIMIT, MAX_TAIL_LIMIT)
}

/// Event log manager
#[derive(Clone)]
pub struct EventLog {
    storage: Storage,
    clock: Arc<dyn Clock>,
    lock_timeout_ms: u64,
}

impl EventLog {
    pub fn new(storage: Storage, clock: Arc<dyn Clock>, lock_timeout_ms: u64) -> Self {
        Self {
            storage,
            clock,
            lock_timeout_ms,
        }
    }

    /// Timestamp and append one event, returning what was written.
    pub fn append(&self, draft: EventDraft) -> Result<Event> {
        if draft.kind.is_empty() {
            return Err(Error::Validation("Missing type".to_string()));
        }

        let event = Event {
            ts: self.clock.now(),
            kind: draft.kind,
            detail: draft.detail,
            extra: draft.extra,
        };

        let path = self.storage.events_file();
        let _lock = FileLock::acquire(lock_path_for(&path), self.lock_timeout_ms)?;
        self.storage.append_jsonl(&path, &event)?;
        tracing::debug!(kind = %event.kind, "event appended");

        Ok(event)
    }

    /// The most recent events, oldest first.
    ///
    /// `limit` is clamped; lines that are not an event (unparsable, or
    /// missing a string `type` or an RFC 3339 `ts`) are skipped, so fewer
    /// than `limit` events may come back.
    pub fn read_tail(&self, limit: usize) -> Result<Vec<Event>> {
        let limit = clamp_limit(Some(limit));
        let lines = self
            .storage
            .read_tail_lines(&self.storage.events_file(), limit)?;

        let mut events = Vec::with_capacity(lines.len());
        for line in lines {
            match serde_json::from_str::<Event>(&line) {
                Ok(event) => events.push(event),
                Err(err) => tracing::debug!(error = %err, "skipping malformed event line"),
            }
        }
        Ok(events)
    }
}
