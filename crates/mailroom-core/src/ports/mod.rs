//! Ports - the seams to everything outside the task core.
//!
//! Each trait hides an external system (record storage, mail delivery,
//! time) so the runner can be exercised with in-memory stand-ins.

pub mod clock;
pub mod id_generator;
pub mod mail_transport;
pub mod notifier;
pub mod sleeper;
pub mod task_store;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::mail_transport::{MailMessage, MailSession, MailTransport, TransportError};
pub use self::notifier::{NotificationSender, SendError};
pub use self::sleeper::{Sleeper, TokioSleeper};
pub use self::task_store::{StoreError, TaskCounts, TaskStore};
