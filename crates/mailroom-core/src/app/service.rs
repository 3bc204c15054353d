//! TaskService - the submission and polling surface.
//!
//! `submit` records a `pending` task and spawns its runner without waiting
//! for it. Runners are detached tasks counted by a `TaskTracker`: dropping
//! the service or cancelling `wait_idle` never aborts one. A runner that
//! panicked is logged by its watcher.

use std::sync::Arc;

use tokio::task::JoinError;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::app::runner::TaskRunner;
use crate::app::status::{HealthCheck, HealthReport};
use crate::config::MailSettings;
use crate::domain::{NotificationRequest, TaskId, TaskKind, TaskRecord};
use crate::ports::{Clock, IdGenerator, StoreError, TaskCounts, TaskStore};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct TaskService {
    store: Arc<dyn TaskStore>,
    runner: Arc<TaskRunner>,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    max_retries: u32,
    mail: Option<MailSettings>,
    inflight: TaskTracker,
}

impl TaskService {
    pub(crate) fn new(
        store: Arc<dyn TaskStore>,
        runner: Arc<TaskRunner>,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        max_retries: u32,
        mail: Option<MailSettings>,
    ) -> Self {
        Self {
            store,
            runner,
            ids,
            clock,
            max_retries,
            mail,
            inflight: TaskTracker::new(),
        }
    }

    /// Record a task and start it in the background. Returns once the
    /// record exists; the runner may not have started yet.
    pub async fn submit(
        &self,
        owner: &str,
        kind: TaskKind,
        payload: serde_json::Value,
    ) -> Result<TaskId, ServiceError> {
        let record = TaskRecord::new(
            self.ids.generate_task_id(),
            owner,
            kind,
            payload.clone(),
            self.max_retries,
            self.clock.now(),
        );
        let id = self.store.create(record).await?;
        info!(task_id = %id, owner, %kind, "task submitted");

        let runner = Arc::clone(&self.runner);
        let handle = match kind {
            TaskKind::Notification => {
                tokio::spawn(async move { runner.run(id, &payload).await })
            }
        };
        // watcher only; dropping it detaches the runner
        self.inflight.spawn(async move { log_join(id, handle.await) });
        Ok(id)
    }

    pub async fn submit_notification(
        &self,
        owner: &str,
        request: &NotificationRequest,
    ) -> Result<TaskId, ServiceError> {
        self.submit(owner, TaskKind::Notification, request.to_payload())
            .await
    }

    pub async fn get_task(&self, id: TaskId) -> Result<Option<TaskRecord>, ServiceError> {
        Ok(self.store.get(id).await?)
    }

    /// True while the task still has attempts left. Unknown ids are `false`.
    pub async fn should_retry(&self, id: TaskId) -> Result<bool, ServiceError> {
        Ok(self
            .store
            .get(id)
            .await?
            .is_some_and(|r| r.retry_count < r.max_retries))
    }

    pub async fn counts(&self) -> Result<TaskCounts, ServiceError> {
        Ok(self.store.counts_by_status().await?)
    }

    /// Number of runners still going.
    pub fn in_flight(&self) -> usize {
        self.inflight.len()
    }

    /// Wait for every runner, including ones submitted while waiting.
    /// Cancel-safe: dropping this future leaves the runners alone.
    pub async fn wait_idle(&self) {
        self.inflight.close();
        self.inflight.wait().await;
        self.inflight.reopen();
    }

    /// Drain in-flight runners, then close the store.
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        self.wait_idle().await;
        self.store.close().await?;
        info!("task service stopped");
        Ok(())
    }

    pub async fn health(&self) -> HealthReport {
        let (store, counts) = match self.store.ping().await {
            Ok(()) => (
                HealthCheck::ok("store", "ok"),
                self.store.counts_by_status().await.ok(),
            ),
            Err(e) => (HealthCheck::failing("store", e.to_string()), None),
        };
        let report =
            HealthReport::from_checks(vec![store, HealthCheck::mail(self.mail.as_ref())], counts);
        debug!(status = ?report.status, "health checked");
        report
    }
}

fn log_join(id: TaskId, done: Result<(), JoinError>) {
    if let Err(e) = done {
        if e.is_panic() {
            error!(task_id = %id, error = %e, "task runner panicked");
        } else {
            debug!(task_id = %id, error = %e, "task runner cancelled");
        }
    }
}
