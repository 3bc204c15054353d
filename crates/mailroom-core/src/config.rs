//! Settings loaded from the environment.
//!
//! `Settings::from_env` reads `.env` (if present) through `dotenvy` and then
//! the process environment. `Settings::from_lookup` takes any lookup
//! function, which is what the tests use.

use std::time::Duration;

use crate::domain::{BackoffSchedule, DEFAULT_MAX_RETRIES};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{name} has an invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

type Result<T> = std::result::Result<T, ConfigError>;

/// Mail delivery settings.
#[derive(Clone, PartialEq, Eq)]
pub struct MailSettings {
    /// Base URL the links in outgoing mail point at.
    pub root_url: String,

    /// Log mail instead of sending it.
    pub console: bool,

    pub server: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,

    /// Bound on each connect and each send.
    pub send_timeout: Duration,
}

impl MailSettings {
    pub const DEFAULT_PORT: u16 = 465;
    pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

    /// Console-mode settings for tests and demos.
    pub fn console(root_url: impl Into<String>) -> Self {
        Self {
            root_url: root_url.into(),
            console: true,
            server: None,
            port: Self::DEFAULT_PORT,
            username: None,
            password: None,
            from: None,
            send_timeout: Self::DEFAULT_SEND_TIMEOUT,
        }
    }

    /// True when everything an SMTP transport needs is present.
    pub fn smtp_configured(&self) -> bool {
        self.server.is_some()
            && self.username.is_some()
            && self.password.is_some()
            && self.from.is_some()
    }

    /// `host:port` of the SMTP server, if one is set.
    pub fn smtp_endpoint(&self) -> Option<String> {
        self.server
            .as_deref()
            .map(|server| format!("{server}:{}", self.port))
    }
}

// Hand-written so the password never ends up in a log line.
impl std::fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailSettings")
            .field("root_url", &self.root_url)
            .field("console", &self.console)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("send_timeout", &self.send_timeout)
            .finish()
    }
}

/// Task runner settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskSettings {
    /// `max_retries` stamped on new records.
    pub max_retries: u32,
    pub backoff: BackoffSchedule,
}

impl Default for TaskSettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: BackoffSchedule::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub mail: MailSettings,
    pub tasks: TaskSettings,
}

impl Settings {
    /// Load from `.env` and the process environment.
    pub fn from_env() -> Result<Self> {
        // .env is optional (development only)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let root_url = get("ROOT_URL").ok_or(ConfigError::Missing("ROOT_URL"))?;
        let console = match get("MAIL_CONSOLE") {
            Some(v) => v.trim().eq_ignore_ascii_case("true"),
            None => false,
        };
        let port = match get("MAIL_PORT") {
            Some(v) => parse_number("MAIL_PORT", &v)?,
            None => MailSettings::DEFAULT_PORT,
        };
        let send_timeout = match get("MAIL_SEND_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(parse_number("MAIL_SEND_TIMEOUT_SECS", &v)?),
            None => MailSettings::DEFAULT_SEND_TIMEOUT,
        };

        let max_retries = match get("TASK_MAX_RETRIES") {
            Some(v) => parse_number::<u32>("TASK_MAX_RETRIES", &v)?,
            None => DEFAULT_MAX_RETRIES,
        };
        if max_retries == 0 {
            return Err(ConfigError::Invalid {
                name: "TASK_MAX_RETRIES",
                value: "0".to_string(),
                reason: "at least one attempt is required".to_string(),
            });
        }
        let backoff = match get("TASK_BACKOFF_SECS") {
            Some(v) => parse_backoff(&v)?,
            None => BackoffSchedule::default(),
        };

        Ok(Self {
            mail: MailSettings {
                root_url,
                console,
                server: get("MAIL_SERVER"),
                port,
                username: get("MAIL_USERNAME"),
                password: get("MAIL_PASSWORD"),
                from: get("MAIL_FROM"),
                send_timeout,
            },
            tasks: TaskSettings {
                max_retries,
                backoff,
            },
        })
    }
}

fn parse_number<T>(name: &'static str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// "1,3,9" -> [1s, 3s, 9s]
fn parse_backoff(value: &str) -> Result<BackoffSchedule> {
    let secs = value
        .split(',')
        .map(|part| parse_number::<u64>("TASK_BACKOFF_SECS", part))
        .collect::<Result<Vec<_>>>()?;
    Ok(BackoffSchedule::from_secs(&secs))
}
