//! Task domain model.
//!
//! Tasks are owned by the backend: this client submits them, polls their
//! snapshots, and turns the terminal snapshot into a single outcome. The
//! only task state the client itself owns is `FlightState`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Shown when a terminal task carries neither result nor error text.
pub const NO_RESPONSE_TEXT: &str = "No response.";

/// Opaque backend-issued task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps a backend-issued identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier as the backend spells it.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for TaskId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Backend-reported processing state of a task.
///
/// Only `Completed` and `Failed` are terminal; everything else keeps the
/// poller running. Statuses this client does not know are folded into
/// `Pending` so a newer backend never wedges the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// An agent is working on the task.
    Processing,
    /// The task finished; `result` is populated.
    Completed,
    /// The task failed; `error` describes why.
    Failed,
    /// Accepted but not picked up yet; also the fold for statuses this
    /// client does not know.
    #[serde(other)]
    Pending,
}

impl TaskStatus {
    /// True for the two states that stop polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The polled view of a task as the backend reports it.
///
/// Created by submission and mutated only by the backend; the client polls
/// and reads. Optional fields appear as the task progresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// Backend task identifier.
    pub id: TaskId,
    /// The submitted task text, echoed back by the backend.
    #[serde(default)]
    pub description: Option<String>,
    /// Current processing state.
    pub status: TaskStatus,
    /// Final output, present once the task completed.
    #[serde(default)]
    pub result: Option<String>,
    /// Failure description, present once the task failed.
    #[serde(default)]
    pub error: Option<String>,
    /// Submission timestamp as reported by the backend.
    #[serde(default)]
    pub created_at: Option<String>,
    /// Terminal timestamp as reported by the backend.
    #[serde(default)]
    pub completed_at: Option<String>,
}

/// Terminal result of a polled task, emitted exactly once per poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    /// The task this outcome belongs to.
    pub task_id: TaskId,
    /// Terminal status (`Completed` or `Failed`).
    pub status: TaskStatus,
    /// Final output when the task completed.
    pub result: Option<String>,
    /// Failure description when the task failed.
    pub error: Option<String>,
}

impl TaskOutcome {
    /// Builds the outcome from a terminal snapshot.
    pub fn from_snapshot(snapshot: TaskSnapshot) -> Self {
        Self {
            task_id: snapshot.id,
            status: snapshot.status,
            result: snapshot.result,
            error: snapshot.error,
        }
    }

    /// True when the task completed rather than failed.
    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Completed
    }

    /// The text appended to the conversation for this outcome.
    ///
    /// Prefers the result, then the backend error text, then a fixed
    /// fallback so the user always sees something. Empty strings count
    /// as absent.
    pub fn message_text(&self) -> String {
        self.result
            .as_deref()
            .filter(|s| !s.is_empty())
            .or(self.error.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(NO_RESPONSE_TEXT)
            .to_string()
    }
}

/// What the client currently has in flight.
///
/// At most one task is in flight at a time; submissions made while this is
/// not `Idle` are rejected as no-ops.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlightState {
    /// Nothing in flight; submissions are accepted.
    #[default]
    Idle,
    /// A submission is on the wire, no task id yet.
    Submitting,
    /// A task is bound and being polled.
    Polling(TaskId),
}

impl FlightState {
    /// True when a new submission would be accepted.
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// True from submission until the terminal event lands.
    pub fn is_in_flight(&self) -> bool {
        !self.is_idle()
    }

    /// The bound task id while polling.
    pub fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Polling(id) => Some(id),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parses_backend_strings() {
        let status: TaskStatus = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(status, TaskStatus::Processing);
        assert!(!status.is_terminal());

        let status: TaskStatus = serde_json::from_str("\"completed\"").unwrap();
        assert!(status.is_terminal());

        let status: TaskStatus = serde_json::from_str("\"failed\"").unwrap();
        assert!(status.is_terminal());
    }

    #[test]
    fn test_unknown_status_folds_into_pending() {
        let status: TaskStatus = serde_json::from_str("\"queued\"").unwrap();
        assert_eq!(status, TaskStatus::Pending);
        assert!(!status.is_terminal());
    }

    #[test]
    fn test_outcome_text_prefers_result() {
        let outcome = TaskOutcome {
            task_id: TaskId::new("t-1"),
            status: TaskStatus::Completed,
            result: Some("All done".to_string()),
            error: Some("ignored".to_string()),
        };
        assert_eq!(outcome.message_text(), "All done");
    }

    #[test]
    fn test_outcome_text_falls_back_to_error() {
        let outcome = TaskOutcome {
            task_id: TaskId::new("t-2"),
            status: TaskStatus::Failed,
            result: None,
            error: Some("model unavailable".to_string()),
        };
        assert_eq!(outcome.message_text(), "model unavailable");
    }

    #[test]
    fn test_outcome_text_fallback_when_both_empty() {
        let outcome = TaskOutcome {
            task_id: TaskId::new("t-3"),
            status: TaskStatus::Completed,
            result: Some(String::new()),
            error: None,
        };
        assert_eq!(outcome.message_text(), NO_RESPONSE_TEXT);
    }

    #[test]
    fn test_flight_state_transitions() {
        let state = FlightState::Idle;
        assert!(state.is_idle());
        assert!(!state.is_in_flight());
        assert_eq!(state.task_id(), None);

        let state = FlightState::Polling(TaskId::new("t-9"));
        assert!(state.is_in_flight());
        assert_eq!(state.task_id().map(TaskId::as_str), Some("t-9"));
    }

    #[test]
    fn test_snapshot_deserializes_with_missing_fields() {
        let json = r#"{"id": "abc", "status": "processing", "result": null}"#;
        let snapshot: TaskSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.id.as_str(), "abc");
        assert_eq!(snapshot.status, TaskStatus::Processing);
        assert_eq!(snapshot.result, None);
        assert_eq!(snapshot.completed_at, None);
    }
}
