//! HTTP JSON API.
//!
//! Thin handlers: parse the request, run the store call on the blocking pool,
//! render JSON. Validation failures become 400 `{ ok: false, error }`; a
//! missing external log is a 200 with `ok: false`.

use std::path::Path;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::activity::ActivitySource;
use crate::clock::{to_wire, Clock};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::{clamp_limit, EventDraft, EventLog};
use crate::ids::IdGenerator;
use crate::storage::Storage;
use crate::task::{TaskDocument, TaskStore, TaskUpsert};

/// Request bodies larger than this are rejected.
pub const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Stores shared by every handler (and by the offline CLI commands).
#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskStore,
    pub events: EventLog,
    pub activity: ActivitySource,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        storage: Storage,
        config: &Config,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self> {
        let timeout_ms = config.locks.timeout_ms;
        let events = EventLog::new(storage.clone(), Arc::clone(&clock), timeout_ms);
        let tasks = TaskStore::new(
            storage,
            config.tasks.clone(),
            events.clone(),
            ids,
            Arc::clone(&clock),
            timeout_ms,
        );
        let activity = ActivitySource::new(config.activity.clone())?;
        Ok(Self {
            tasks,
            events,
            activity,
            clock,
        })
    }
}

/// Build the router. Anything outside `/api` is served from `web_dir`.
pub fn router(state: AppState, web_dir: Option<&Path>) -> Router {
    let api = Router::new()
        .route("/api/health", get(health))
        .route("/api/tasks", get(list_tasks).post(upsert_task))
        .route("/api/logs", get(logs))
        .route("/api/activity", get(activity))
        .route("/api/events", get(list_events).post(append_event))
        .with_state(Arc::new(state));

    let app = match web_dir {
        Some(dir) => api.fallback_service(ServeDir::new(dir)),
        None => api,
    };

    app.layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(TraceLayer::new_for_http())
}

type SharedState = Arc<AppState>;

#[derive(Debug, Deserialize)]
pub struct LinesQuery {
    lines: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    limit: Option<String>,
}

/// Lenient count parsing: any decimal number (`150`, `150.0`, `1e3`) is
/// floored, junk falls back to the default, negatives floor to zero (and
/// are then clamped by the caller).
fn parse_count(raw: Option<&str>) -> Option<usize> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    let n = raw.parse::<f64>().ok().filter(|n| !n.is_nan())?;
    // Float-to-int `as` saturates, so infinities land on 0 or usize::MAX.
    Some(n.max(0.0).floor() as usize)
}

/// A missing, empty, or non-object body reads as `{}`.
fn parse_body(body: &Bytes) -> Result<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    let value: Value = serde_json::from_slice(body)
        .map_err(|err| Error::Validation(format!("Invalid JSON body: {err}")))?;
    if value.is_object() {
        Ok(value)
    } else {
        Ok(Value::Object(Default::default()))
    }
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| Error::OperationFailed(format!("blocking task failed: {err}")))?
}

/// GET /api/health
async fn health(State(state): State<SharedState>) -> Json<Value> {
    Json(json!({ "ok": true, "ts": to_wire(&state.clock.now()) }))
}

/// GET /api/tasks
async fn list_tasks(State(state): State<SharedState>) -> Result<Json<TaskDocument>> {
    let tasks = blocking(move || Ok(state.tasks.get())).await?;
    Ok(Json(TaskDocument { tasks }))
}

/// POST /api/tasks
async fn upsert_task(State(state): State<SharedState>, body: Bytes) -> Result<Json<Value>> {
    let request = TaskUpsert::from_body(&parse_body(&body)?)?;
    let task = blocking(move || state.tasks.upsert(request)).await?;
    Ok(Json(json!({ "ok": true, "task": task })))
}

/// GET /api/logs?lines=N
async fn logs(State(state): State<SharedState>, Query(query): Query<LinesQuery>) -> Response {
    let lines = crate::activity::clamp_log_lines(parse_count(query.lines.as_deref()));
    match blocking(move || state.activity.read_logs(lines)).await {
        Ok(tail) => Json(json!({ "ok": true, "path": tail.path, "lines": tail.lines })).into_response(),
        Err(Error::NotAvailable(message)) => {
            Json(json!({ "ok": false, "error": message, "lines": "" })).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// GET /api/activity
async fn activity(State(state): State<SharedState>) -> Response {
    match blocking(move || state.activity.read_activity(None)).await {
        Ok(feed) => Json(json!({ "ok": true, "path": feed.path, "items": feed.items })).into_response(),
        Err(Error::NotAvailable(message)) => {
            Json(json!({ "ok": false, "error": message, "items": [] })).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// GET /api/events?limit=N
async fn list_events(
    State(state): State<SharedState>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Value>> {
    let limit = clamp_limit(parse_count(query.limit.as_deref()));
    let events = blocking(move || state.events.read_tail(limit)).await?;
    Ok(Json(json!({ "ok": true, "events": events })))
}

/// POST /api/events
async fn append_event(State(state): State<SharedState>, body: Bytes) -> Result<Json<Value>> {
    let draft = EventDraft::from_body(&parse_body(&body)?)?;
    let event = blocking(move || state.events.append(draft)).await?;
    Ok(Json(json!({ "ok": true, "event": event })))
}
