//! TaskRunner - drives one notification task to a terminal state.
//!
//! # Flow
//! 1. Decode and validate the payload; incomplete payloads fail at once
//! 2. For each permitted attempt: mark `processing`, call the sender
//! 3. Success: write `completed` with a delivery receipt
//! 4. Failure: classify, ask the `Decider`, then either fail the task or
//!    count the retry and sleep the backoff delay
//!
//! `run` never returns an error. Every outcome ends up in the task record,
//! and store write failures are logged and otherwise ignored.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::{
    DEFAULT_MAX_RETRIES, Decider, Decision, DeliveryReceipt, FailureReason, NotificationKind,
    NotificationRequest, TaskId, TaskUpdate, classify,
};
use crate::ports::{Clock, NotificationSender, Sleeper, TaskStore};

pub const STEP_SENDING: &str = "sending notification";
pub const STEP_SENT: &str = "notification sent";
pub const STEP_INVALID: &str = "invalid notification data";

pub const INVALID_PAYLOAD_ERROR: &str =
    "missing required notification data: notification_type, destination, or token";
pub const RETRIES_EXCEEDED_ERROR: &str = "maximum retries exceeded";

pub struct TaskRunner {
    store: Arc<dyn TaskStore>,
    sender: Arc<dyn NotificationSender>,
    decider: Arc<dyn Decider>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
}

impl TaskRunner {
    pub fn new(
        store: Arc<dyn TaskStore>,
        sender: Arc<dyn NotificationSender>,
        decider: Arc<dyn Decider>,
        sleeper: Arc<dyn Sleeper>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            sender,
            decider,
            sleeper,
            clock,
        }
    }

    pub async fn run(&self, id: TaskId, payload: &serde_json::Value) {
        let Some(request) = NotificationRequest::from_payload(payload).validate() else {
            warn!(task_id = %id, "notification payload incomplete");
            self.write(
                id,
                TaskUpdate::failed(STEP_INVALID, INVALID_PAYLOAD_ERROR).with_retry_count(0),
            )
            .await;
            return;
        };

        let kind = request.notification_type.parse::<NotificationKind>();
        let max_retries = self.max_retries(id).await;

        for attempt in 0..max_retries {
            let step = if attempt == 0 {
                STEP_SENDING.to_string()
            } else {
                format!("retrying attempt {}/{}", attempt + 1, max_retries)
            };
            self.write(id, TaskUpdate::processing(step, attempt)).await;

            let kind = match &kind {
                Ok(kind) => *kind,
                Err(unknown) => {
                    self.fail(id, FailureReason::Permanent, &unknown.to_string(), attempt)
                        .await;
                    return;
                }
            };

            let description = match self
                .sender
                .send(&request.destination, kind, &request.token)
                .await
            {
                Ok(()) => {
                    let receipt = DeliveryReceipt::sent(
                        kind,
                        request.destination.as_str(),
                        attempt + 1,
                        self.clock.now(),
                    );
                    self.write(id, TaskUpdate::completed(STEP_SENT, receipt.to_json(), attempt))
                        .await;
                    info!(task_id = %id, %kind, attempts = attempt + 1, "notification sent");
                    return;
                }
                Err(e) => e.to_string(),
            };

            let error_kind = classify(&description);
            match self.decider.decide(attempt, max_retries, error_kind) {
                Decision::Fail { reason } => {
                    self.fail(id, reason, &description, attempt).await;
                    return;
                }
                Decision::Retry {
                    delay,
                    next_attempt,
                } => {
                    warn!(
                        task_id = %id,
                        attempt,
                        next_attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %description,
                        "notification attempt failed, retrying"
                    );
                    match self.store.increment_retry(id).await {
                        Ok(true) => {}
                        Ok(false) => warn!(task_id = %id, "retry not counted: record missing or terminal"),
                        Err(e) => warn!(task_id = %id, error = %e, "failed to count retry"),
                    }
                    self.sleeper.sleep(delay).await;
                }
            }
        }

        // The decider stops on the last permitted attempt, so this only runs
        // if a custom Decider keeps asking for retries past max_retries.
        error!(task_id = %id, max_retries, "retry loop ended without a decision");
        self.write(
            id,
            TaskUpdate::failed("notification failed", RETRIES_EXCEEDED_ERROR)
                .with_retry_count(max_retries),
        )
        .await;
    }

    async fn max_retries(&self, id: TaskId) -> u32 {
        match self.store.get(id).await {
            Ok(Some(record)) => record.max_retries.max(1),
            Ok(None) => {
                warn!(task_id = %id, "task record not found, using default max_retries");
                DEFAULT_MAX_RETRIES
            }
            Err(e) => {
                warn!(task_id = %id, error = %e, "failed to read task record, using default max_retries");
                DEFAULT_MAX_RETRIES
            }
        }
    }

    async fn fail(&self, id: TaskId, reason: FailureReason, description: &str, attempt: u32) {
        error!(task_id = %id, attempt, %reason, error = %description, "notification failed");
        let update = TaskUpdate::failed(
            format!("notification failed ({reason})"),
            format!("{reason}: {description}"),
        )
        .with_retry_count(attempt);
        self.write(id, update).await;
    }

    async fn write(&self, id: TaskId, update: TaskUpdate) {
        match self.store.update(id, update).await {
            Ok(true) => {}
            Ok(false) => warn!(task_id = %id, "task update ignored: record missing or terminal"),
            Err(e) => warn!(task_id = %id, error = %e, "failed to update task record"),
        }
    }
}
