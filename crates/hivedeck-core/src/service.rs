//! Backend service contract.
//!
//! `TaskService` is the seam between the client core and the HTTP backend.
//! `hivedeck-interaction` implements it over REST; tests substitute
//! scripted implementations. Consumers hold it as `Arc<dyn TaskService>`.

use async_trait::async_trait;

use crate::dashboard::{ActivityEntry, Agent, HistoryEntry, SystemStatus};
use crate::error::Result;
use crate::task::{TaskId, TaskSnapshot};

/// Operations the task backend exposes to this client.
///
/// Every call is request/response against current backend state, with no
/// client-side caching. Implementations must be safe to call from
/// concurrent tasks.
#[async_trait]
pub trait TaskService: Send + Sync {
    /// Submits task text for processing and returns the backend task id.
    ///
    /// # Errors
    ///
    /// Returns `HivedeckError::Submission` carrying display-ready text when
    /// the backend rejects the task or cannot be reached.
    async fn submit_task(&self, text: &str) -> Result<TaskId>;

    /// Fetches the current snapshot of a task.
    ///
    /// # Errors
    ///
    /// Returns `HivedeckError::Fetch` on transport failure or when the
    /// backend does not know the task.
    async fn fetch_task(&self, id: &TaskId) -> Result<TaskSnapshot>;

    /// Fetches the agent roster.
    async fn fetch_agents(&self) -> Result<Vec<Agent>>;

    /// Fetches the aggregate system counters.
    async fn fetch_status(&self) -> Result<SystemStatus>;

    /// Fetches the recent activity log.
    async fn fetch_activity(&self) -> Result<Vec<ActivityEntry>>;

    /// Fetches the completed task history.
    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>>;
}
