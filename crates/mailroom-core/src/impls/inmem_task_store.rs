//! In-memory task store.
//!
//! Development and test backend. One `tokio::sync::Mutex` guards the whole
//! map and every operation finishes inside a single lock scope, which gives
//! per-record atomicity without holding the lock across an await.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{TaskId, TaskRecord, TaskStatus, TaskUpdate};
use crate::ports::{Clock, StoreError, SystemClock, TaskCounts, TaskStore};

struct InMemoryState {
    /// All task records (single source of truth).
    records: HashMap<TaskId, TaskRecord>,

    /// Set by `close`; every later call fails.
    closed: bool,
}

impl InMemoryState {
    fn open(&self) -> Result<(), StoreError> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    /// Mutable access to a record that may still be written.
    fn writable(&mut self, id: TaskId) -> Option<&mut TaskRecord> {
        match self.records.get_mut(&id) {
            Some(record) if !record.status.is_terminal() => Some(record),
            Some(_) => {
                debug!(task_id = %id, "ignoring write to terminal task");
                None
            }
            None => None,
        }
    }

    fn counts_by_status(&self) -> TaskCounts {
        let mut counts = TaskCounts::default();
        for record in self.records.values() {
            match record.status {
                TaskStatus::Pending => counts.pending += 1,
                TaskStatus::Processing => counts.processing += 1,
                TaskStatus::Completed => counts.completed += 1,
                TaskStatus::Failed => counts.failed += 1,
            }
        }
        counts
    }
}

/// In-memory `TaskStore`.
pub struct InMemoryTaskStore {
    state: Mutex<InMemoryState>,
    clock: Arc<dyn Clock>,
}

impl InMemoryTaskStore {
    /// Open a store stamping `updated_at` from the wall clock.
    pub fn connect() -> Arc<Self> {
        Self::connect_with_clock(Arc::new(SystemClock))
    }

    pub fn connect_with_clock(clock: Arc<dyn Clock>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(InMemoryState {
                records: HashMap::new(),
                closed: false,
            }),
            clock,
        })
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn create(&self, record: TaskRecord) -> Result<TaskId, StoreError> {
        let mut state = self.state.lock().await;
        state.open()?;

        let id = record.id;
        if state.records.contains_key(&id) {
            return Err(StoreError::AlreadyExists(id));
        }
        state.records.insert(id, record);
        Ok(id)
    }

    async fn get(&self, id: TaskId) -> Result<Option<TaskRecord>, StoreError> {
        let state = self.state.lock().await;
        state.open()?;
        Ok(state.records.get(&id).cloned())
    }

    async fn update(&self, id: TaskId, update: TaskUpdate) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        state.open()?;

        let Some(record) = state.writable(id) else {
            return Ok(false);
        };
        record.apply(&update, now);
        Ok(true)
    }

    async fn increment_retry(&self, id: TaskId) -> Result<bool, StoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        state.open()?;

        let Some(record) = state.writable(id) else {
            return Ok(false);
        };
        record.retry_count += 1;
        record.updated_at = now;
        Ok(true)
    }

    async fn counts_by_status(&self) -> Result<TaskCounts, StoreError> {
        let state = self.state.lock().await;
        state.open()?;
        Ok(state.counts_by_status())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.state.lock().await.open()
    }

    async fn close(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.closed = true;
        debug!(records = state.records.len(), "in-memory task store closed");
        Ok(())
    }
}
