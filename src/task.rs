//! Task store.
//!
//! Tasks live in a single JSON document, `tasks.json`, shaped as
//! `{ "tasks": [...] }`. Every upsert reads the whole document, edits it and
//! rewrites it atomically while holding the document's lock, then records a
//! `task.upsert` event.
//!
//! Only an unparsable file or a non-array `tasks` makes the document corrupt.
//! Individual records that don't read as a [`Task`] are hidden from `get()`
//! but written back untouched.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::Clock;
use crate::config::TasksConfig;
use crate::error::{Error, Result};
use crate::events::{EventDraft, EventLog, TASK_UPSERT};
use crate::ids::IdGenerator;
use crate::lock::{lock_path_for, FileLock};
use crate::storage::Storage;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub status: String,
    #[serde(default)]
    pub detail: String,
    #[serde(with = "crate::clock::wire")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::clock::wire")]
    pub updated_at: DateTime<Utc>,
}

/// The persisted document. Order is display order: newest tasks first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskDocument {
    pub tasks: Vec<Task>,
}

/// On-disk shape, records kept raw.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawDocument {
    tasks: Vec<Value>,
}

/// A validated create-or-update request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpsert {
    pub id: Option<String>,
    pub title: String,
    pub status: Option<String>,
    pub detail: Option<String>,
}

impl TaskUpsert {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Blank `id`, `status` and `detail` count as absent.
    pub fn normalized(self) -> Self {
        Self {
            id: self.id.filter(|id| !id.is_empty()),
            title: self.title,
            status: self.status.filter(|status| !status.is_empty()),
            detail: self.detail.filter(|detail| !detail.is_empty()),
        }
    }

    /// Parse a `POST /api/tasks` body.
    ///
    /// Empty strings count as absent, matching how the dashboard front end
    /// submits blank form fields. A numeric id is accepted as its decimal
    /// rendering.
    pub fn from_body(body: &Value) -> Result<Self> {
        let title = match body.get("title") {
            Some(Value::String(title)) if !title.is_empty() => title.clone(),
            _ => return Err(Error::Validation("Missing title".to_string())),
        };

        let id = match body.get("id") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => None,
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(n)) if n.as_f64() == Some(0.0) => None,
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(_) => return Err(Error::Validation("Invalid id".to_string())),
        };

        Ok(Self {
            id,
            title,
            status: optional_text(body, "status")?,
            detail: optional_text(body, "detail")?,
        }
        .normalized())
    }

    fn validate(&self) -> Result<()> {
        if self.title.is_empty() {
            return Err(Error::Validation("Missing title".to_string()));
        }
        Ok(())
    }
}

fn optional_text(body: &Value, field: &str) -> Result<Option<String>> {
    match body.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) => Ok(Some(text.clone())),
        Some(_) => Err(Error::Validation(format!("{field} must be a string"))),
    }
}

#[derive(Clone)]
pub struct TaskStore {
    storage: Storage,
    config: TasksConfig,
    events: EventLog,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    lock_timeout_ms: u64,
}

impl TaskStore {
    pub fn new(
        storage: Storage,
        config: TasksConfig,
        events: EventLog,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        lock_timeout_ms: u64,
    ) -> Self {
        Self {
            storage,
            config,
            events,
            ids,
            clock,
            lock_timeout_ms,
        }
    }

    /// Write an empty document if none exists yet.
    pub fn ensure_document(&self) -> Result<()> {
        let path = self.storage.tasks_file();
        let _lock = FileLock::acquire(lock_path_for(&path), self.lock_timeout_ms)?;
        if !path.exists() {
            self.storage.write_json(&path, &TaskDocument::default())?;
        }
        Ok(())
    }

    /// All readable tasks as persisted. Missing or corrupt documents read as
    /// empty.
    pub fn get(&self) -> Vec<Task> {
        let document = match read_document(&self.storage, &self.storage.tasks_file()) {
            Ok(document) => document,
            Err(err) => {
                tracing::warn!(error = %err, "treating task document as empty");
                return Vec::new();
            }
        };

        document
            .tasks
            .into_iter()
            .filter_map(|record| match serde_json::from_value::<Task>(record) {
                Ok(task) => Some(task),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping unreadable task record");
                    None
                }
            })
            .collect()
    }

    /// Load the document, surfacing corruption (including any unreadable
    /// record) instead of hiding it.
    pub fn load_strict(&self) -> Result<TaskDocument> {
        let path = self.storage.tasks_file();
        let document = read_document(&self.storage, &path)?;
        let tasks = document
            .tasks
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                serde_json::from_value::<Task>(record).map_err(|err| Error::Corrupt {
                    path: path.clone(),
                    reason: format!("task {index}: {err}"),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(TaskDocument { tasks })
    }

    /// Create a task, or merge into the task with the same id.
    pub fn upsert(&self, request: TaskUpsert) -> Result<Task> {
        let request = request.normalized();
        request.validate()?;

        let path = self.storage.tasks_file();
        let task = {
            let _lock = FileLock::acquire(lock_path_for(&path), self.lock_timeout_ms)?;

            let mut document = match read_document(&self.storage, &path) {
                Ok(document) => document,
                Err(Error::Corrupt { path, reason }) => {
                    tracing::warn!(path = %path.display(), %reason, "replacing corrupt task document");
                    RawDocument::default()
                }
                Err(err) => return Err(err),
            };

            let now = self.clock.now();
            let id = match request.id {
                Some(id) => id,
                None => self.ids.task_id(now),
            };

            let position = document
                .tasks
                .iter()
                .position(|record| record_has_id(record, &id));
            let task = match position {
                Some(index) => {
                    let mut existing =
                        salvage_task(&document.tasks[index], &id, now, &self.config.default_status);
                    existing.title = request.title;
                    if let Some(status) = request.status {
                        existing.status = status;
                    }
                    if let Some(detail) = request.detail {
                        existing.detail = detail;
                    }
                    existing.updated_at = now;
                    document.tasks[index] = serde_json::to_value(&existing)?;
                    existing
                }
                None => {
                    let task = Task {
                        id,
                        title: request.title,
                        status: request
                            .status
                            .unwrap_or_else(|| self.config.default_status.clone()),
                        detail: request.detail.unwrap_or_default(),
                        created_at: now,
                        updated_at: now,
                    };
                    document.tasks.insert(0, serde_json::to_value(&task)?);
                    task
                }
            };

            self.storage.write_json(&path, &document)?;
            task
        };

        tracing::info!(id = %task.id, status = %task.status, "task upserted");
        self.events
            .append(EventDraft::new(TASK_UPSERT).with_field("task", &task)?)?;

        Ok(task)
    }
}

fn record_has_id(record: &Value, id: &str) -> bool {
    match record.get("id") {
        Some(Value::String(existing)) => existing == id,
        Some(Value::Number(existing)) => existing.to_string() == id,
        _ => false,
    }
}

/// Rebuild a task from a stored record, keeping whatever fields still read.
fn salvage_task(record: &Value, id: &str, now: DateTime<Utc>, default_status: &str) -> Task {
    if let Ok(task) = serde_json::from_value::<Task>(record.clone()) {
        return task;
    }

    let text = |field: &str| match record.get(field) {
        Some(Value::String(text)) => Some(text.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    };
    let time = |field: &str| {
        record
            .get(field)
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|at| at.with_timezone(&Utc))
    };

    Task {
        id: id.to_string(),
        title: text("title").unwrap_or_default(),
        status: text("status").unwrap_or_else(|| default_status.to_string()),
        detail: text("detail").unwrap_or_default(),
        created_at: time("createdAt").unwrap_or(now),
        updated_at: time("updatedAt").unwrap_or(now),
    }
}

fn read_document(storage: &Storage, path: &Path) -> Result<RawDocument> {
    if !path.exists() {
        return Ok(RawDocument::default());
    }
    storage
        .read_json::<RawDocument>(path)
        .map_err(|err| match err {
            Error::Json(json) => Error::Corrupt {
                path: path.to_path_buf(),
                reason: json.to_string(),
            },
            other => other,
        })
}
