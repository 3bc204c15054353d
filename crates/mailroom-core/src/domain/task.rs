//! Task record: the unit of trackable background work.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::TaskId;

/// Default ceiling on attempts for a new task.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Task category. Only notifications exist today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Notification,
}

impl TaskKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskKind::Notification => "notification",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task status.
///
/// State transitions:
/// - Pending -> Processing -> Completed
/// - Pending -> Processing -> Failed
/// - Pending -> Failed (payload rejected before the first attempt)
///
/// Completed and Failed are absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Recorded, runner not started yet.
    Pending,

    /// An attempt is in flight or a retry is waiting out its backoff.
    Processing,

    /// Delivered. `result` is set.
    Completed,

    /// Given up. `error` is set.
    Failed,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// The stored task. This is also the shape a status-polling endpoint serializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub owner: String,
    pub kind: TaskKind,
    pub status: TaskStatus,

    /// Human-readable description of the current activity.
    pub step: String,

    /// Kind-specific input, immutable after creation.
    pub payload: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    pub retry_count: u32,
    pub max_retries: u32,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRecord {
    /// A fresh `pending` record. `max_retries` below 1 is raised to 1 so a
    /// runner always gets at least one attempt.
    pub fn new(
        id: TaskId,
        owner: impl Into<String>,
        kind: TaskKind,
        payload: serde_json::Value,
        max_retries: u32,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            owner: owner.into(),
            kind,
            status: TaskStatus::Pending,
            step: "queued".to_string(),
            payload,
            result: None,
            error: None,
            retry_count: 0,
            max_retries: max_retries.max(1),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update. Fields not carried by `update` are left alone.
    ///
    /// `result`/`error` that don't belong to the resulting status are cleared,
    /// so a record never shows both (or shows one while still in flight).
    pub fn apply(&mut self, update: &TaskUpdate, now: DateTime<Utc>) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(step) = &update.step {
            self.step = step.clone();
        }
        if let Some(result) = &update.result {
            self.result = Some(result.clone());
        }
        if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }
        if let Some(retry_count) = update.retry_count {
            self.retry_count = retry_count;
        }

        if self.status != TaskStatus::Completed {
            self.result = None;
        }
        if self.status != TaskStatus::Failed {
            self.error = None;
        }
        self.updated_at = now;
    }
}

/// Partial update of a task record.
///
/// Build one through the status constructors; each carries exactly the
/// fields its transition is allowed to touch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub step: Option<String>,
    pub result: Option<serde_json::Value>,
    pub error: Option<String>,
    pub retry_count: Option<u32>,
}

impl TaskUpdate {
    pub fn processing(step: impl Into<String>, retry_count: u32) -> Self {
        Self {
            status: Some(TaskStatus::Processing),
            step: Some(step.into()),
            retry_count: Some(retry_count),
            ..Self::default()
        }
    }

    pub fn completed(step: impl Into<String>, result: serde_json::Value, retry_count: u32) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            step: Some(step.into()),
            result: Some(result),
            retry_count: Some(retry_count),
            ..Self::default()
        }
    }

    pub fn failed(step: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            step: Some(step.into()),
            error: Some(error.into()),
            ..Self::default()
        }
    }

    pub fn with_retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }
}
