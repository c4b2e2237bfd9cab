//! Task id generation.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use ulid::Ulid;

/// Prefix shared by every generated task id.
pub const TASK_ID_PREFIX: &str = "t_";

pub trait IdGenerator: Send + Sync {
    /// A fresh task id, given the time of the upsert that needs it.
    fn task_id(&self, now: DateTime<Utc>) -> String;
}

/// `t_<random hex>_<epoch millis>`, the random part drawn from a ULID.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn task_id(&self, now: DateTime<Utc>) -> String {
        format!(
            "{TASK_ID_PREFIX}{:x}_{}",
            Ulid::new().random(),
            now.timestamp_millis()
        )
    }
}

/// Deterministic `t_1`, `t_2`, ... for tests and fixtures.
#[derive(Debug, Default)]
pub struct SequentialIds {
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for SequentialIds {
    fn task_id(&self, _now: DateTime<Utc>) -> String {
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{TASK_ID_PREFIX}{n}")
    }
}
