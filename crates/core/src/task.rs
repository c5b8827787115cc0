//! Remote task status model.
//!
//! The status endpoint answers with a record of the shape
//! `{"status": "<STATE>", "response": ..., "error_message": ...}`.
//! Only `DONE` and `ERROR` are terminal; every other state (including
//! ones this crate does not know about) means "keep polling".

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::types::CorrelationId;

/// Lifecycle state of a remote job.
///
/// Transitions: `Submitted -> Running -> {Done, Error}` or
/// `Submitted -> {Done, Error}`. `Running` repeats until a terminal
/// state is reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TaskStatus {
    Submitted,
    Running,
    Done,
    Error,
    /// A state string this client does not recognise. Treated as
    /// non-terminal.
    Other(String),
}

impl TaskStatus {
    /// Whether polling should stop on this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl From<String> for TaskStatus {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DONE" => Self::Done,
            "ERROR" => Self::Error,
            "RUNNING" => Self::Running,
            "SUBMITTED" | "CREATED" | "QUEUED" | "PENDING" => Self::Submitted,
            _ => Self::Other(raw),
        }
    }
}

impl From<TaskStatus> for String {
    fn from(status: TaskStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submitted => f.write_str("SUBMITTED"),
            Self::Running => f.write_str("RUNNING"),
            Self::Done => f.write_str("DONE"),
            Self::Error => f.write_str("ERROR"),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

/// A single answer from the task status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub status: TaskStatus,
    /// Result payload, present once the status is `DONE`. Usually a
    /// string holding encoded JSON, occasionally an inline JSON value.
    #[serde(default)]
    pub response: Option<serde_json::Value>,
    #[serde(default, alias = "error")]
    pub error_message: Option<String>,
}

impl TaskRecord {
    /// The response payload as raw text, if the record carries one.
    pub fn payload(&self) -> Option<TaskResponse> {
        match &self.response {
            None | Some(serde_json::Value::Null) => None,
            Some(serde_json::Value::String(raw)) => Some(TaskResponse(raw.clone())),
            Some(value) => Some(TaskResponse(value.to_string())),
        }
    }
}

/// Raw payload of a completed task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskResponse(String);

impl TaskResponse {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Decode the payload into a typed result.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.0)
    }
}

/// How a polled task ended.
///
/// A remote `ERROR` is reported as [`TaskOutcome::Failed`] rather than
/// as an error value: the poll itself succeeded, the job did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed(TaskResponse),
    Failed {
        correlation_id: CorrelationId,
        message: Option<String>,
    },
}

impl TaskOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn response(&self) -> Option<&TaskResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::Failed { .. } => None,
        }
    }

    pub fn into_response(self) -> Option<TaskResponse> {
        match self {
            Self::Completed(response) => Some(response),
            Self::Failed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_known_statuses_case_insensitively() {
        assert_eq!(TaskStatus::from("done".to_string()), TaskStatus::Done);
        assert_eq!(TaskStatus::from("ERROR".to_string()), TaskStatus::Error);
        assert_eq!(TaskStatus::from("Running".to_string()), TaskStatus::Running);
        assert_eq!(TaskStatus::from("QUEUED".to_string()), TaskStatus::Submitted);
    }

    #[test]
    fn unknown_status_is_preserved_and_non_terminal() {
        let status = TaskStatus::from("WARMING_UP".to_string());
        assert_matches!(&status, TaskStatus::Other(raw) if raw == "WARMING_UP");
        assert!(!status.is_terminal());
    }

    #[test]
    fn only_done_and_error_are_terminal() {
        assert!(TaskStatus::Done.is_terminal());
        assert!(TaskStatus::Error.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
        assert!(!TaskStatus::Submitted.is_terminal());
    }

    #[test]
    fn string_payload_is_returned_verbatim() {
        let json = r#"{"status":"DONE","response":"{\"result\":42}"}"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, TaskStatus::Done);
        assert_eq!(record.payload().unwrap().as_str(), r#"{"result":42}"#);
    }

    #[test]
    fn inline_payload_is_serialized() {
        let json = r#"{"status":"DONE","response":{"result":42}}"#;
        let record: TaskRecord = serde_json::from_str(json).unwrap();
        let payload = record.payload().unwrap();
        let value: serde_json::Value = payload.json().unwrap();
        assert_eq!(value["result"], 42);
    }

    #[test]
    fn running_record_has_no_payload() {
        let record: TaskRecord = serde_json::from_str(r#"{"status":"RUNNING"}"#).unwrap();
        assert!(record.payload().is_none());

        let record: TaskRecord =
            serde_json::from_str(r#"{"status":"RUNNING","response":null}"#).unwrap();
        assert!(record.payload().is_none());
    }

    #[test]
    fn error_alias_is_accepted() {
        let record: TaskRecord =
            serde_json::from_str(r#"{"status":"ERROR","error":"out of memory"}"#).unwrap();
        assert_eq!(record.error_message.as_deref(), Some("out of memory"));
    }

    #[test]
    fn failed_outcome_has_no_response() {
        let outcome = TaskOutcome::Failed {
            correlation_id: CorrelationId::new("abc"),
            message: None,
        };
        assert!(!outcome.is_completed());
        assert!(outcome.into_response().is_none());
    }
}
