//! Notification payload and delivery receipt.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Which notification to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Email address confirmation after registration (or a resend).
    Verification,

    /// Password reset link.
    PasswordReset,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Verification => "verification",
            NotificationKind::PasswordReset => "password_reset",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification type: {0}")]
pub struct UnknownNotificationKind(pub String);

impl FromStr for NotificationKind {
    type Err = UnknownNotificationKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "verification" => Ok(NotificationKind::Verification),
            "password_reset" => Ok(NotificationKind::PasswordReset),
            other => Err(UnknownNotificationKind(other.to_string())),
        }
    }
}

/// Payload of a notification task as stored on the record.
///
/// Every field is optional at the serde level: an incomplete payload must
/// still be recordable so the runner can fail it with a readable error.
/// `notification_type` stays a string because an unknown type is a runtime
/// failure of the task, not a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notification_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// A payload with all required fields present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidNotification {
    pub notification_type: String,
    pub destination: String,
    pub token: String,
}

impl NotificationRequest {
    pub fn new(
        kind: NotificationKind,
        destination: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        Self {
            notification_type: Some(kind.as_str().to_string()),
            destination: Some(destination.into()),
            token: Some(token.into()),
        }
    }

    /// Decode from a task payload. Anything that isn't an object of the
    /// expected shape decodes to an empty request and fails validation.
    pub fn from_payload(payload: &serde_json::Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or_default()
    }

    pub fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    /// `None` if any required field is missing or blank.
    pub fn validate(&self) -> Option<ValidNotification> {
        fn present(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }

        Some(ValidNotification {
            notification_type: present(&self.notification_type)?,
            destination: present(&self.destination)?,
            token: present(&self.token)?,
        })
    }
}

/// Structured outcome stored in `TaskRecord::result` on completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryReceipt {
    pub notification_type: NotificationKind,
    pub destination: String,
    pub attempt_count: u32,

    /// Completion marker, always `"sent"`.
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

impl DeliveryReceipt {
    pub fn sent(
        kind: NotificationKind,
        destination: impl Into<String>,
        attempt_count: u32,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            notification_type: kind,
            destination: destination.into(),
            attempt_count,
            status: "sent".to_string(),
            sent_at,
        }
    }

    /// JSON stored as the task result. Same shape as the serde form.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "notification_type": self.notification_type.as_str(),
            "destination": self.destination,
            "attempt_count": self.attempt_count,
            "status": self.status,
            "sent_at": self.sent_at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::verification("verification", NotificationKind::Verification)]
    #[case::password_reset("password_reset", NotificationKind::PasswordReset)]
    fn known_kinds_parse(#[case] raw: &str, #[case] expected: NotificationKind) {
        assert_eq!(raw.parse::<NotificationKind>().unwrap(), expected);
        assert_eq!(expected.to_string(), raw);
    }

    #[test]
    fn unknown_kind_names_the_offender() {
        let err = "newsletter".parse::<NotificationKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown notification type: newsletter");
    }

    #[test]
    fn complete_payload_validates() {
        let req = NotificationRequest::new(NotificationKind::Verification, "a@b.c", "tok");
        let payload = req.to_payload();
        assert_eq!(
            payload,
            json!({"notification_type": "verification", "destination": "a@b.c", "token": "tok"})
        );

        let valid = NotificationRequest::from_payload(&payload).validate().unwrap();
        assert_eq!(valid.destination, "a@b.c");
        assert_eq!(valid.token, "tok");
    }

    #[rstest]
    #[case::no_type(json!({"destination": "a@b.c", "token": "t"}))]
    #[case::no_destination(json!({"notification_type": "verification", "token": "t"}))]
    #[case::no_token(json!({"notification_type": "verification", "destination": "a@b.c"}))]
    #[case::blank_token(json!({"notification_type": "verification", "destination": "a@b.c", "token": "  "}))]
    #[case::not_an_object(json!("verification"))]
    fn incomplete_payload_is_rejected(#[case] payload: serde_json::Value) {
        assert!(NotificationRequest::from_payload(&payload).validate().is_none());
    }

    #[test]
    fn receipt_json_matches_its_serde_form() {
        use chrono::TimeZone;
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap();
        let receipt = DeliveryReceipt::sent(NotificationKind::PasswordReset, "a@b.c", 2, at);

        let value = receipt.to_json();
        assert_eq!(value, serde_json::to_value(&receipt).unwrap());
        assert_eq!(value["notification_type"], "password_reset");
        assert_eq!(value["attempt_count"], 2);
        assert_eq!(value["status"], "sent");

        let back: DeliveryReceipt = serde_json::from_value(value).unwrap();
        assert_eq!(back, receipt);
    }

    #[test]
    fn unknown_type_still_validates_as_complete() {
        // The runner fails it later as a permanent error, with its own message.
        let payload = json!({"notification_type": "fax", "destination": "a@b.c", "token": "t"});
        let valid = NotificationRequest::from_payload(&payload).validate().unwrap();
        assert_eq!(valid.notification_type, "fax");
    }
}
