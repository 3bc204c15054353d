//! Status - health reporting for the task subsystem.

use serde::Serialize;

use crate::config::MailSettings;
use crate::ports::TaskCounts;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Result of one component check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub name: &'static str,
    pub ok: bool,
    pub detail: String,
}

impl HealthCheck {
    pub fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: true,
            detail: detail.into(),
        }
    }

    pub fn failing(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            ok: false,
            detail: detail.into(),
        }
    }

    /// Mail is usable in console mode or with a complete SMTP identity.
    /// `None` means the sender was injected directly and isn't inspected.
    pub fn mail(settings: Option<&MailSettings>) -> Self {
        match settings {
            None => Self::ok("mail", "custom sender"),
            Some(s) if s.console => Self::ok("mail", "console"),
            Some(s) if s.smtp_configured() => Self::ok(
                "mail",
                format!("smtp {}", s.smtp_endpoint().unwrap_or_default()),
            ),
            Some(_) => Self::failing(
                "mail",
                "mail configuration incomplete: MAIL_SERVER, MAIL_USERNAME, MAIL_PASSWORD and MAIL_FROM are required",
            ),
        }
    }
}

/// Overall health. `Degraded` as soon as any check fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub checks: Vec<HealthCheck>,

    /// Absent when the store could not be read.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<TaskCounts>,
}

impl HealthReport {
    pub fn from_checks(checks: Vec<HealthCheck>, counts: Option<TaskCounts>) -> Self {
        let status = if checks.iter().all(|c| c.ok) {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        };
        Self {
            status,
            checks,
            counts,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_failing_check_degrades() {
        let report = HealthReport::from_checks(
            vec![
                HealthCheck::ok("store", "ok"),
                HealthCheck::failing("mail", "nope"),
            ],
            None,
        );
        assert_eq!(report.status, HealthStatus::Degraded);
        assert!(!report.is_healthy());
    }

    #[test]
    fn mail_check_follows_settings() {
        let mut mail = MailSettings::console("http://localhost");
        assert!(HealthCheck::mail(Some(&mail)).ok);

        mail.console = false;
        assert!(!HealthCheck::mail(Some(&mail)).ok);

        mail.server = Some("smtp.example.com".into());
        mail.username = Some("mailer".into());
        mail.from = Some("noreply@example.com".into());
        assert!(!HealthCheck::mail(Some(&mail)).ok);

        mail.password = Some("hunter2".into());
        let check = HealthCheck::mail(Some(&mail));
        assert!(check.ok);
        assert_eq!(check.detail, "smtp smtp.example.com:465");

        assert!(HealthCheck::mail(None).ok);
    }

    #[test]
    fn serializes_status_in_snake_case() {
        let report = HealthReport::from_checks(vec![HealthCheck::ok("store", "ok")], None);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "healthy");
        assert!(json.get("counts").is_none());
    }
}
