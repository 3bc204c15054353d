//! AppBuilder - ports を組み合わせて `TaskService` を構築
//!
//! # Fail-fast 設計
//! - store と sender にはデフォルトがない。未設定なら `build` が `BuildError` を返す
//! - それ以外は本番用の実装にフォールバック

use std::sync::Arc;

use crate::app::runner::TaskRunner;
use crate::app::service::TaskService;
use crate::config::{MailSettings, Settings, TaskSettings};
use crate::domain::{Decider, DefaultDecider};
use crate::impls::{ConsoleTransport, Mailer};
use crate::ports::{
    Clock, IdGenerator, MailTransport, NotificationSender, Sleeper, SystemClock, TaskStore,
    TokioSleeper, UlidGenerator,
};

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no task store configured; call AppBuilder::store")]
    MissingStore,

    #[error("no notification sender configured; call AppBuilder::mail or AppBuilder::sender")]
    MissingSender,
}

/// AppBuilder は TaskService を構築
///
/// # 使用例
/// ```ignore
/// let service = AppBuilder::new()
///     .store(InMemoryTaskStore::connect())
///     .mail(settings.mail.clone(), Arc::new(ConsoleTransport))
///     .build()?;
/// ```
pub struct AppBuilder {
    store: Option<Arc<dyn TaskStore>>,
    sender: Option<Arc<dyn NotificationSender>>,
    decider: Option<Arc<dyn Decider>>,
    sleeper: Arc<dyn Sleeper>,
    clock: Arc<dyn Clock>,
    ids: Option<Arc<dyn IdGenerator>>,
    tasks: TaskSettings,
    mail: Option<MailSettings>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            store: None,
            sender: None,
            decider: None,
            sleeper: Arc::new(TokioSleeper),
            clock: Arc::new(SystemClock),
            ids: None,
            tasks: TaskSettings::default(),
            mail: None,
        }
    }

    /// Task settings from `settings`, plus a console `Mailer` when
    /// `MAIL_CONSOLE` is on. SMTP deployments still call `mail` with their
    /// transport.
    pub fn from_settings(settings: &Settings) -> Self {
        let builder = Self::new().task_settings(settings.tasks.clone());
        if settings.mail.console {
            builder.mail(settings.mail.clone(), Arc::new(ConsoleTransport))
        } else {
            Self {
                mail: Some(settings.mail.clone()),
                ..builder
            }
        }
    }

    pub fn store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Send through a `Mailer` over `transport`.
    pub fn mail(mut self, settings: MailSettings, transport: Arc<dyn MailTransport>) -> Self {
        self.sender = Some(Arc::new(Mailer::new(&settings, transport)));
        self.mail = Some(settings);
        self
    }

    /// Use `sender` as is. Health reporting won't inspect mail settings.
    pub fn sender(mut self, sender: Arc<dyn NotificationSender>) -> Self {
        self.sender = Some(sender);
        self.mail = None;
        self
    }

    pub fn decider(mut self, decider: Arc<dyn Decider>) -> Self {
        self.decider = Some(decider);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn task_settings(mut self, tasks: TaskSettings) -> Self {
        self.tasks = tasks;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.tasks.max_retries = max_retries;
        self
    }

    pub fn build(self) -> Result<TaskService, BuildError> {
        let store = self.store.ok_or(BuildError::MissingStore)?;
        let sender = self.sender.ok_or(BuildError::MissingSender)?;
        let decider = self
            .decider
            .unwrap_or_else(|| Arc::new(DefaultDecider::new(self.tasks.backoff.clone())));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(Arc::clone(&self.clock))));

        let runner = TaskRunner::new(
            Arc::clone(&store),
            sender,
            decider,
            self.sleeper,
            Arc::clone(&self.clock),
        );
        Ok(TaskService::new(
            store,
            Arc::new(runner),
            ids,
            self.clock,
            self.tasks.max_retries,
            self.mail,
        ))
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}
