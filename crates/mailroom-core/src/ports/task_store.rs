//! TaskStore port - persistence for task records.
//!
//! Pure data access: no retry logic, no classification. Every operation is
//! atomic at single-record granularity; there are no cross-record
//! transactions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{TaskId, TaskRecord, TaskUpdate};

/// Errors from a task store backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("task already exists: {0}")]
    AlreadyExists(TaskId),

    #[error("task store is closed")]
    Closed,
}

/// Number of records per status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCounts {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.pending + self.processing + self.completed + self.failed
    }
}

/// Keyed store of task records.
///
/// # Contract
/// - `update` applies only the supplied fields and always refreshes `updated_at`
/// - `update` and `increment_retry` return `false` for unknown ids and for
///   records already in a terminal status (terminal records are immutable)
/// - a write must never be dropped silently under concurrent access
///
/// # Lifecycle
/// The handle is created explicitly by its backend and handed to the app;
/// `close` is called once on shutdown. After that every call fails with
/// `StoreError::Closed`.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` on a duplicate id.
    async fn create(&self, record: TaskRecord) -> Result<TaskId, StoreError>;

    async fn get(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError>;

    async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<bool, StoreError>;

    /// Atomically add one to `retry_count`.
    async fn increment_retry(&self, id: TaskId) -> Result<bool, StoreError>;

    async fn counts_by_status(&self) -> Result<TaskCounts, StoreError>;

    /// Liveness check used by health reporting.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) -> Result<(), StoreError>;
}
