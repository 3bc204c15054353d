//! Test doubles shared by the unit tests, the integration tests and the CLI demo.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::NotificationKind;
use crate::ports::{NotificationSender, SendError, Sleeper};

/// One call observed by `ScriptedSender`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCall {
    pub destination: String,
    pub kind: NotificationKind,
    pub token: String,
}

/// Sender that replays a fixed script of outcomes, one per call.
///
/// Once the script runs out every further call gets `then`.
pub struct ScriptedSender {
    script: Mutex<VecDeque<Result<(), SendError>>>,
    then: Result<(), SendError>,
    calls: Mutex<Vec<SentCall>>,
}

impl ScriptedSender {
    pub fn new(script: Vec<Result<(), SendError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            then: Ok(()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every call succeeds.
    pub fn succeeding() -> Self {
        Self::new(Vec::new())
    }

    /// Every call fails with `error`.
    pub fn failing(error: SendError) -> Self {
        Self {
            then: Err(error),
            ..Self::new(Vec::new())
        }
    }

    /// `n` failures with `error`, then success.
    pub fn failing_times(n: usize, error: SendError) -> Self {
        Self::new(vec![Err(error); n])
    }

    pub fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn attempts(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSender for ScriptedSender {
    async fn send(
        &self,
        destination: &str,
        kind: NotificationKind,
        token: &str,
    ) -> Result<(), SendError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(SentCall {
                destination: destination.to_string(),
                kind,
                token: token.to_string(),
            });
        }
        let next = self.script.lock().ok().and_then(|mut s| s.pop_front());
        next.unwrap_or_else(|| self.then.clone())
    }
}

/// Sleeper that records each requested delay and returns at once.
#[derive(Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, delay: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(delay);
        }
        tokio::task::yield_now().await;
    }
}
