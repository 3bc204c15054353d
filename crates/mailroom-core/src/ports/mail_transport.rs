//! MailTransport port - the wire underneath `Mailer`.
//!
//! A transport hands out one session per delivery attempt. Sessions are
//! never shared across attempts; the caller always ends them with `quit`,
//! whether the send worked or not.

use async_trait::async_trait;

/// A composed email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("{0}")]
    Io(String),
}

/// One open connection to the mail service.
#[async_trait]
pub trait MailSession: Send {
    async fn send(&mut self, message: &MailMessage) -> Result<(), TransportError>;

    /// Release the connection. Called exactly once per session.
    async fn quit(self: Box<Self>) -> Result<(), TransportError>;
}

/// Opens sessions.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn MailSession>, TransportError>;

    /// Short label for logs and health reports ("console", "smtp", ...).
    fn name(&self) -> &'static str;
}
