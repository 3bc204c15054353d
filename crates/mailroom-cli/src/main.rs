//! mailroom: submit a notification task and follow it to a terminal state.
//!
//! Mail goes through the console transport (logged, not delivered), so
//! `send` requires `MAIL_CONSOLE=true`. `--fail-times` makes the first N connects fail so the retry path can be
//! watched.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::time::sleep;
use tracing::info;

use mailroom_core::impls::{ConsoleTransport, InMemoryTaskStore};
use mailroom_core::ports::{MailSession, MailTransport, TransportError};
use mailroom_core::{
    AppBuilder, MailSettings, NotificationKind, NotificationRequest, Settings, TaskService,
};

#[derive(Parser)]
#[command(name = "mailroom")]
#[command(about = "Asynchronous notification tasks with bounded retry", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a notification and poll it until it completes or fails
    ///
    /// Mail is logged by the console transport, never delivered; requires
    /// MAIL_CONSOLE=true.
    Send {
        /// Recipient address
        to: String,

        #[arg(long, value_enum, default_value_t = KindArg::Verification)]
        kind: KindArg,

        /// Token embedded in the link
        #[arg(long, default_value = "demo-token")]
        token: String,

        /// Requesting principal recorded on the task
        #[arg(long, default_value = "cli")]
        owner: String,

        /// Fail this many connects before letting mail through
        #[arg(long, default_value_t = 0)]
        fail_times: u32,

        /// Error text used for the injected failures
        #[arg(long, default_value = "connection timeout")]
        fail_with: String,

        /// Status poll interval in milliseconds
        #[arg(long, env = "MAILROOM_POLL_MS", default_value_t = 50)]
        poll_ms: u64,
    },

    /// Print the health report as JSON
    Health,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Verification,
    PasswordReset,
}

impl From<KindArg> for NotificationKind {
    fn from(k: KindArg) -> Self {
        match k {
            KindArg::Verification => NotificationKind::Verification,
            KindArg::PasswordReset => NotificationKind::PasswordReset,
        }
    }
}

/// Console transport whose first `remaining_failures` connects fail.
struct FlakyTransport {
    inner: ConsoleTransport,
    remaining_failures: AtomicU32,
    error: String,
}

#[async_trait]
impl MailTransport for FlakyTransport {
    async fn connect(&self) -> Result<Box<dyn MailSession>, TransportError> {
        let left = self.remaining_failures.load(Ordering::Relaxed);
        if left > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(TransportError::Io(format!("{} (left={left})", self.error)));
        }
        self.inner.connect().await
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// `send` only has the console transport to deliver with.
fn require_console(mail: &MailSettings) -> Result<()> {
    if !mail.console {
        bail!("send logs mail through the console transport only; set MAIL_CONSOLE=true");
    }
    Ok(())
}

fn build(settings: &Settings, fail_times: u32, fail_with: String) -> Result<TaskService> {
    let transport = FlakyTransport {
        inner: ConsoleTransport,
        remaining_failures: AtomicU32::new(fail_times),
        error: fail_with,
    };
    AppBuilder::from_settings(settings)
        .store(InMemoryTaskStore::connect())
        .mail(settings.mail.clone(), Arc::new(transport))
        .build()
        .context("wiring task service")
}

#[tokio::main]
async fn main() -> Result<()> {
    mailroom_core::observability::init();
    let cli = Cli::parse();
    let settings = Settings::from_env().context("loading settings from environment")?;

    match cli.command {
        Commands::Send {
            to,
            kind,
            token,
            owner,
            fail_times,
            fail_with,
            poll_ms,
        } => {
            require_console(&settings.mail)?;
            let service = build(&settings, fail_times, fail_with)?;
            let request = NotificationRequest::new(kind.into(), to, token);
            let id = service
                .submit_notification(&owner, &request)
                .await
                .context("submitting notification")?;
            info!(task_id = %id, "submitted");

            let record = loop {
                let record = service
                    .get_task(id)
                    .await?
                    .with_context(|| format!("task {id} disappeared"))?;
                if record.status.is_terminal() {
                    break record;
                }
                sleep(Duration::from_millis(poll_ms)).await;
            };

            println!("{}", serde_json::to_string_pretty(&record)?);
            println!("{}", serde_json::to_string(&service.counts().await?)?);
            service.shutdown().await?;
        }
        Commands::Health => {
            let service = build(&settings, 0, String::new())?;
            println!("{}", serde_json::to_string_pretty(&service.health().await)?);
            service.shutdown().await?;
        }
    }
    Ok(())
}
