//! NotificationSender port - delivers one notification.
//!
//! The runner knows nothing about how delivery happens. All it gets back on
//! failure is a `SendError`, and that error's text is the only input to
//! failure classification, so implementations must describe failures in
//! plain words ("connection timeout", "invalid credentials", ...).

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::NotificationKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// Transport-level failure; the message is passed through verbatim.
    #[error("{0}")]
    Transport(String),

    #[error("connection timeout after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("invalid email address: {0}")]
    InvalidRecipient(String),
}

/// Sends one notification of `kind` to `destination`.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send(
        &self,
        destination: &str,
        kind: NotificationKind,
        token: &str,
    ) -> Result<(), SendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ErrorKind, classify};

    #[test]
    fn error_texts_classify_as_intended() {
        assert_eq!(
            classify(&SendError::Timeout(Duration::from_secs(30)).to_string()),
            ErrorKind::Retryable
        );
        assert_eq!(
            classify(&SendError::InvalidRecipient("nobody".into()).to_string()),
            ErrorKind::Terminal
        );
        assert_eq!(
            SendError::Transport("connection refused".into()).to_string(),
            "connection refused"
        );
    }
}
