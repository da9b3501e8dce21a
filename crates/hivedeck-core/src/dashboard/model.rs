//! Dashboard domain models.
//!
//! These mirror what the backend reports about itself. The client never
//! mutates any of this; it refreshes and displays.

use serde::{Deserialize, Serialize};

use crate::task::TaskStatus;

/// Reported state of a single backend agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Currently working on a task.
    Active,
    /// Occupied with internal work.
    Busy,
    /// Waiting for work.
    Idle,
    /// The backend flagged the agent as unhealthy; also the fold for
    /// statuses this client does not know.
    #[serde(other)]
    Error,
}

/// A worker agent on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// Backend agent identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Current reported state.
    pub status: AgentStatus,
    /// Agent specialization ("coordinator", "research", ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// One-line description of what the agent does.
    #[serde(default)]
    pub description: String,
    /// Capability labels for display.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Aggregate counters reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SystemStatus {
    /// Agents currently working.
    pub active_agents: u32,
    /// Agents waiting for work.
    #[serde(default)]
    pub idle_agents: u32,
    /// All registered agents.
    pub total_agents: u32,
    /// Tasks currently being processed.
    pub active_tasks: u32,
    /// Tasks completed since the backend started.
    #[serde(default)]
    pub total_completed_tasks: u64,
    /// Tasks failed since the backend started.
    #[serde(default)]
    pub total_failed_tasks: u64,
}

/// Display metrics derived from the aggregate counters.
///
/// The backend exposes no real resource telemetry; these are the
/// conventional approximations the dashboard renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemLoad {
    /// Approximated processor load in percent, 25 per active agent.
    pub cpu_usage: u32,
    /// Approximated memory load in percent, 15 per agent, capped at 100.
    pub memory_usage: u32,
    /// Tasks currently being processed, passed through.
    pub active_tasks: u32,
}

impl SystemLoad {
    /// Derives the display load from the reported counters.
    pub fn from_status(status: &SystemStatus) -> Self {
        Self {
            cpu_usage: status.active_agents * 25,
            memory_usage: (status.total_agents * 15).min(100),
            active_tasks: status.active_tasks,
        }
    }
}

/// Severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    /// Something finished well.
    Success,
    /// Something went wrong.
    Error,
    /// Routine progress note; also the fold for kinds this client does
    /// not know.
    #[default]
    #[serde(other)]
    Info,
}

/// One entry in the backend activity log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Backend entry identifier.
    pub id: String,
    /// When the entry was recorded, as the backend formats it.
    pub timestamp: String,
    /// Name of the agent the entry is about.
    pub agent: String,
    /// What happened.
    pub action: String,
    /// Entry severity.
    #[serde(rename = "type", default)]
    pub kind: ActivityKind,
    /// The task the entry relates to, when there is one.
    #[serde(default)]
    pub task_id: Option<String>,
}

/// One completed task in the backend history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The task identifier.
    pub id: String,
    /// The submitted task text.
    pub task: String,
    /// Submission timestamp as the backend formats it.
    pub timestamp: String,
    /// Terminal status of the task.
    pub status: TaskStatus,
    /// Result excerpt; the backend truncates long results.
    #[serde(default)]
    pub result: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_derivation() {
        let status = SystemStatus {
            active_agents: 2,
            idle_agents: 2,
            total_agents: 4,
            active_tasks: 1,
            total_completed_tasks: 10,
            total_failed_tasks: 1,
        };

        let load = SystemLoad::from_status(&status);
        assert_eq!(load.cpu_usage, 50);
        assert_eq!(load.memory_usage, 60);
        assert_eq!(load.active_tasks, 1);
    }

    #[test]
    fn test_memory_load_is_capped() {
        let status = SystemStatus {
            total_agents: 20,
            ..SystemStatus::default()
        };
        assert_eq!(SystemLoad::from_status(&status).memory_usage, 100);
    }

    #[test]
    fn test_agent_status_folds_unknown_into_error() {
        let status: AgentStatus = serde_json::from_str("\"rebooting\"").unwrap();
        assert_eq!(status, AgentStatus::Error);
    }

    #[test]
    fn test_activity_entry_defaults() {
        let json = r#"{
            "id": "a-1",
            "timestamp": "2026-01-05T10:00:00Z",
            "agent": "System",
            "action": "Task started: hello"
        }"#;
        let entry: ActivityEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, ActivityKind::Info);
        assert_eq!(entry.task_id, None);
    }
}
