//! Domain model (ids, task records, notification payloads, classification,
//! backoff and retry decisions).

pub mod backoff;
pub mod decision;
pub mod errors;
pub mod ids;
pub mod notification;
pub mod task;

pub use backoff::BackoffSchedule;
pub use decision::{Decider, Decision, DefaultDecider, FailureReason};
pub use errors::{ErrorKind, classify};
pub use ids::{ParseTaskIdError, TaskId};
pub use notification::{
    DeliveryReceipt, NotificationKind, NotificationRequest, UnknownNotificationKind,
    ValidNotification,
};
pub use task::{DEFAULT_MAX_RETRIES, TaskKind, TaskRecord, TaskStatus, TaskUpdate};
