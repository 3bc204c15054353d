//! Mailer - `NotificationSender` that composes mail and hands it to a transport.
//!
//! Every `send` is one delivery attempt with its own session:
//! connect, send, quit. The session is quit whether the send worked or not,
//! and connect and send are each bounded by `send_timeout`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::MailSettings;
use crate::domain::NotificationKind;
use crate::ports::{MailMessage, MailTransport, NotificationSender, SendError};

const DEFAULT_FROM: &str = "noreply@localhost";

pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    root_url: String,
    from: String,
    send_timeout: Duration,
}

impl Mailer {
    pub fn new(settings: &MailSettings, transport: Arc<dyn MailTransport>) -> Self {
        Self {
            transport,
            root_url: settings.root_url.trim_end_matches('/').to_string(),
            from: settings
                .from
                .clone()
                .unwrap_or_else(|| DEFAULT_FROM.to_string()),
            send_timeout: settings.send_timeout,
        }
    }

    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Build the message for `kind`. Rejects destinations that can't be an
    /// email address before any connection is made.
    pub fn compose(
        &self,
        destination: &str,
        kind: NotificationKind,
        token: &str,
    ) -> Result<MailMessage, SendError> {
        if !looks_like_email(destination) {
            return Err(SendError::InvalidRecipient(destination.to_string()));
        }

        let (subject, link, action) = match kind {
            NotificationKind::Verification => (
                "Email Verification",
                format!("{}/verify-email/{token}", self.root_url),
                "confirm your email address",
            ),
            NotificationKind::PasswordReset => (
                "Password Reset",
                format!("{}/reset-password/{token}", self.root_url),
                "reset your password",
            ),
        };

        Ok(MailMessage {
            from: self.from.clone(),
            to: destination.to_string(),
            subject: subject.to_string(),
            html_body: format!(
                "<p>Follow the link below to {action}.</p>\n<p><a href=\"{link}\">{link}</a></p>"
            ),
        })
    }
}

fn looks_like_email(s: &str) -> bool {
    match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !s.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[async_trait]
impl NotificationSender for Mailer {
    async fn send(
        &self,
        destination: &str,
        kind: NotificationKind,
        token: &str,
    ) -> Result<(), SendError> {
        let message = self.compose(destination, kind, token)?;

        let mut session = match timeout(self.send_timeout, self.transport.connect()).await {
            Ok(Ok(session)) => session,
            Ok(Err(e)) => return Err(SendError::Transport(e.to_string())),
            Err(_) => return Err(SendError::Timeout(self.send_timeout)),
        };

        let sent = match timeout(self.send_timeout, session.send(&message)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(SendError::Transport(e.to_string())),
            Err(_) => Err(SendError::Timeout(self.send_timeout)),
        };

        if let Err(e) = session.quit().await {
            warn!(transport = self.transport.name(), error = %e, "mail session quit failed");
        }

        if sent.is_ok() {
            debug!(transport = self.transport.name(), to = %destination, %kind, "mail handed to transport");
        }
        sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MailSession, TransportError};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records every message and counts connects and quits.
    #[derive(Default)]
    struct RecordingTransport {
        sent: Arc<Mutex<Vec<MailMessage>>>,
        connects: AtomicUsize,
        quits: Arc<AtomicUsize>,
        fail_send: Option<TransportError>,
        hang_send: bool,
    }

    struct RecordingSession {
        sent: Arc<Mutex<Vec<MailMessage>>>,
        quits: Arc<AtomicUsize>,
        fail_send: Option<TransportError>,
        hang_send: bool,
    }

    #[async_trait]
    impl MailSession for RecordingSession {
        async fn send(&mut self, message: &MailMessage) -> Result<(), TransportError> {
            if self.hang_send {
                std::future::pending::<()>().await;
            }
            if let Some(e) = self.fail_send.clone() {
                return Err(e);
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn quit(self: Box<Self>) -> Result<(), TransportError> {
            self.quits.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn connect(&self) -> Result<Box<dyn MailSession>, TransportError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(RecordingSession {
                sent: self.sent.clone(),
                quits: self.quits.clone(),
                fail_send: self.fail_send.clone(),
                hang_send: self.hang_send,
            }))
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    struct RefusingTransport;

    #[async_trait]
    impl MailTransport for RefusingTransport {
        async fn connect(&self) -> Result<Box<dyn MailSession>, TransportError> {
            Err(TransportError::Connect("connection refused".into()))
        }

        fn name(&self) -> &'static str {
            "refusing"
        }
    }

    fn settings() -> MailSettings {
        let mut s = MailSettings::console("https://app.example.com/");
        s.from = Some("noreply@example.com".into());
        s
    }

    #[tokio::test]
    async fn verification_mail_links_to_verify_page() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = Mailer::new(&settings(), transport.clone());

        mailer
            .send("user@example.com", NotificationKind::Verification, "tok123")
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Email Verification");
        assert_eq!(sent[0].from, "noreply@example.com");
        assert_eq!(sent[0].to, "user@example.com");
        assert!(sent[0]
            .html_body
            .contains("https://app.example.com/verify-email/tok123"));
    }

    #[tokio::test]
    async fn reset_mail_links_to_reset_page() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = Mailer::new(&settings(), transport.clone());

        mailer
            .send("user@example.com", NotificationKind::PasswordReset, "r1")
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent[0].subject, "Password Reset");
        assert!(sent[0]
            .html_body
            .contains("https://app.example.com/reset-password/r1"));
    }

    #[tokio::test]
    async fn each_send_uses_a_fresh_session_and_quits_it() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = Mailer::new(&settings(), transport.clone());

        for _ in 0..3 {
            mailer
                .send("user@example.com", NotificationKind::Verification, "t")
                .await
                .unwrap();
        }
        assert_eq!(transport.connects.load(Ordering::SeqCst), 3);
        assert_eq!(transport.quits.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_send_still_quits_and_keeps_the_message() {
        let transport = Arc::new(RecordingTransport {
            fail_send: Some(TransportError::Auth("invalid credentials".into())),
            ..Default::default()
        });
        let mailer = Mailer::new(&settings(), transport.clone());

        let err = mailer
            .send("user@example.com", NotificationKind::Verification, "t")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SendError::Transport("authentication failed: invalid credentials".into())
        );
        assert_eq!(transport.quits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hung_send_times_out_and_quits() {
        let transport = Arc::new(RecordingTransport {
            hang_send: true,
            ..Default::default()
        });
        let mailer = Mailer::new(&settings(), transport.clone());

        let err = mailer
            .send("user@example.com", NotificationKind::Verification, "t")
            .await
            .unwrap_err();
        assert_eq!(err, SendError::Timeout(Duration::from_secs(30)));
        assert_eq!(err.to_string(), "connection timeout after 30s");
        assert_eq!(transport.quits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connect_failure_is_reported_as_transport_error() {
        let mailer = Mailer::new(&settings(), Arc::new(RefusingTransport));
        let err = mailer
            .send("user@example.com", NotificationKind::Verification, "t")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection failed: connection refused");
    }

    #[tokio::test]
    async fn bad_address_never_connects() {
        let transport = Arc::new(RecordingTransport::default());
        let mailer = Mailer::new(&settings(), transport.clone());

        let err = mailer
            .send("not-an-address", NotificationKind::Verification, "t")
            .await
            .unwrap_err();
        assert_eq!(err, SendError::InvalidRecipient("not-an-address".into()));
        assert_eq!(transport.connects.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn missing_from_falls_back() {
        let mailer = Mailer::new(
            &MailSettings::console("http://localhost"),
            Arc::new(RecordingTransport::default()),
        );
        let msg = mailer
            .compose("a@b.c", NotificationKind::Verification, "t")
            .unwrap();
        assert_eq!(msg.from, DEFAULT_FROM);
        assert_eq!(mailer.transport_name(), "recording");
    }
}
