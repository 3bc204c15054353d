//! App - ties the ports together.
//!
//! # Components
//! - **AppBuilder**: wiring and fail-fast validation
//! - **TaskRunner**: one task's attempt loop
//! - **TaskService**: submit, poll, health, shutdown
//! - **status**: health report types

pub mod builder;
pub mod runner;
pub mod service;
pub mod status;

pub use self::builder::{AppBuilder, BuildError};
pub use self::runner::TaskRunner;
pub use self::service::{ServiceError, TaskService};
pub use self::status::{HealthCheck, HealthReport, HealthStatus};
