//! mailroom-core
//!
//! Asynchronous notification tasks with bounded retry.
//!
//! # Modules
//! - **domain**: task records, notification payloads, failure classification,
//!   backoff and retry decisions
//! - **ports**: seams to the outside (TaskStore, NotificationSender,
//!   MailTransport, Clock, Sleeper, IdGenerator)
//! - **impls**: in-memory store, console transport, `Mailer`
//! - **app**: `AppBuilder`, `TaskRunner`, `TaskService`, health
//! - **config**: settings from the environment
//! - **observability**: tracing subscriber setup
//! - **testing**: scripted sender and recording sleeper

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod observability;
pub mod ports;
pub mod testing;

pub use app::{AppBuilder, BuildError, HealthReport, ServiceError, TaskService};
pub use config::{ConfigError, MailSettings, Settings, TaskSettings};
pub use domain::{NotificationKind, NotificationRequest, TaskId, TaskKind, TaskRecord, TaskStatus};
