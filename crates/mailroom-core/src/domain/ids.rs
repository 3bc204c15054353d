//! Domain identifiers.
//!
//! Task ids are ULIDs: sortable by creation time and generated without
//! coordination. On the wire and in logs they carry a `task-` prefix so
//! they can't be confused with user or token identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

const TASK_PREFIX: &str = "task-";

/// Identifier of a task record. Immutable once generated.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TaskId(Ulid);

impl TaskId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for TaskId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{TASK_PREFIX}{}", self.0)
    }
}

/// Returned when a string is not a `task-<ULID>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid task id: {0}")]
pub struct ParseTaskIdError(String);

impl FromStr for TaskId {
    type Err = ParseTaskIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix(TASK_PREFIX).unwrap_or(s);
        Ulid::from_string(raw)
            .map(TaskId)
            .map_err(|_| ParseTaskIdError(s.to_string()))
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TaskId {
    type Error = ParseTaskIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_carries_prefix() {
        let ulid = Ulid::new();
        let id = TaskId::from_ulid(ulid);
        assert_eq!(id.to_string(), format!("task-{ulid}"));
        assert_eq!(id.as_ulid(), ulid);
    }

    #[test]
    fn parses_with_and_without_prefix() {
        let id = TaskId::from_ulid(Ulid::new());
        let with_prefix: TaskId = id.to_string().parse().unwrap();
        let bare: TaskId = id.as_ulid().to_string().parse().unwrap();
        assert_eq!(with_prefix, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn rejects_garbage() {
        let err = "task-not-a-ulid".parse::<TaskId>().unwrap_err();
        assert!(err.to_string().contains("task-not-a-ulid"));
    }

    #[test]
    fn serializes_as_prefixed_string() {
        let id = TaskId::from_ulid(Ulid::new());
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));

        let back: TaskId = serde_json::from_value(json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn ids_sort_by_creation_time() {
        let id1 = TaskId::from_ulid(Ulid::new());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = TaskId::from_ulid(Ulid::new());
        assert!(id1 < id2);
    }
}
