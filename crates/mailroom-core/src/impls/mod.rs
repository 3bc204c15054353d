//! Impls - concrete adapters for the ports.

pub mod console_transport;
pub mod inmem_task_store;
pub mod mailer;

pub use self::console_transport::ConsoleTransport;
pub use self::inmem_task_store::InMemoryTaskStore;
pub use self::mailer::Mailer;
