//! ConsoleTransport - writes mail to the log instead of sending it.
//!
//! Used when `MAIL_CONSOLE=true` (local development, demos). Never fails.

use async_trait::async_trait;
use tracing::info;

use crate::ports::{MailMessage, MailSession, MailTransport, TransportError};

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleTransport;

struct ConsoleSession;

#[async_trait]
impl MailSession for ConsoleSession {
    async fn send(&mut self, message: &MailMessage) -> Result<(), TransportError> {
        info!(
            from = %message.from,
            to = %message.to,
            subject = %message.subject,
            body = %message.html_body,
            "fake send"
        );
        Ok(())
    }

    async fn quit(self: Box<Self>) -> Result<(), TransportError> {
        Ok(())
    }
}

#[async_trait]
impl MailTransport for ConsoleTransport {
    async fn connect(&self) -> Result<Box<dyn MailSession>, TransportError> {
        Ok(Box::new(ConsoleSession))
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn console_session_accepts_anything() {
        let mut session = ConsoleTransport.connect().await.unwrap();
        let msg = MailMessage {
            from: "noreply@example.com".into(),
            to: "a@b.c".into(),
            subject: "Hi".into(),
            html_body: "<p>hi</p>".into(),
        };
        session.send(&msg).await.unwrap();
        session.quit().await.unwrap();
        assert_eq!(ConsoleTransport.name(), "console");
    }
}
