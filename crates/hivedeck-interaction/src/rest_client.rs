//! REST implementation of the backend service contract.
//!
//! The backend encodes failures in the response body (`success: false` with
//! an `error` string), with or without a matching HTTP status, so every call
//! here parses the body first and treats the envelope as the source of
//! truth. Responses must reflect current backend state; caching is disabled
//! on every request.

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use hivedeck_core::dashboard::{ActivityEntry, Agent, HistoryEntry, SystemStatus};
use hivedeck_core::error::{HivedeckError, Result};
use hivedeck_core::service::TaskService;
use hivedeck_core::task::{TaskId, TaskSnapshot};

use crate::config::BackendConfig;

/// Shown when the backend cannot be reached or answers with garbage.
pub const NETWORK_ERROR_TEXT: &str = "Network error. Please try again.";
/// Shown when the backend rejects a submission without saying why.
pub const SUBMIT_REJECTED_TEXT: &str = "Sorry, something went wrong.";

/// `TaskService` implementation over the backend's REST API.
///
/// Holds only the connection pool and the resolved settings; safe to clone
/// and call from concurrent tasks.
#[derive(Clone)]
pub struct RestTaskService {
    client: Client,
    base_url: String,
    timeout: Duration,
}

#[derive(Debug, Serialize)]
struct SubmitTaskRequest<'a> {
    task: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitTaskResponse {
    success: bool,
    #[serde(default)]
    task_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskEnvelope {
    success: bool,
    #[serde(default)]
    task: Option<TaskSnapshot>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AgentsEnvelope {
    success: bool,
    #[serde(default)]
    agents: Vec<Agent>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusEnvelope {
    success: bool,
    #[serde(default)]
    status: Option<SystemStatus>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ActivityEnvelope {
    success: bool,
    #[serde(default)]
    activities: Vec<ActivityEntry>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HistoryEnvelope {
    success: bool,
    #[serde(default)]
    history: Vec<HistoryEntry>,
    #[serde(default)]
    error: Option<String>,
}

impl RestTaskService {
    /// Creates a service from connection settings.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            timeout: config.timeout(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a GET and parses the envelope.
    ///
    /// Transport failures and undecodable bodies map to `Fetch`; the
    /// caller checks the envelope's `success` flag.
    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(self.url(path))
            .header("Cache-Control", "no-store")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| HivedeckError::fetch(format!("Request to {} failed: {}", path, e)))?;

        let status = response.status();
        response.json::<T>().await.map_err(|e| {
            HivedeckError::fetch(format!(
                "Failed to parse response from {} ({}): {}",
                path, status, e
            ))
        })
    }

    fn envelope_error(error: Option<String>, fallback: &str) -> HivedeckError {
        HivedeckError::fetch(error.unwrap_or_else(|| fallback.to_string()))
    }
}

#[async_trait]
impl TaskService for RestTaskService {
    async fn submit_task(&self, text: &str) -> Result<TaskId> {
        let response = self
            .client
            .post(self.url("/api/tasks"))
            .header("Cache-Control", "no-store")
            .json(&SubmitTaskRequest { task: text })
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(target: "rest", "Task submission transport failure: {}", e);
                HivedeckError::submission(NETWORK_ERROR_TEXT)
            })?;

        let status = response.status();
        let envelope = response.json::<SubmitTaskResponse>().await.map_err(|e| {
            tracing::debug!(
                target: "rest",
                "Undecodable submission response ({}): {}",
                status,
                e
            );
            HivedeckError::submission(NETWORK_ERROR_TEXT)
        })?;

        match envelope.task_id {
            Some(task_id) if envelope.success => {
                tracing::debug!(target: "rest", "Task accepted: {}", task_id);
                Ok(TaskId::new(task_id))
            }
            _ => Err(HivedeckError::submission(
                envelope
                    .error
                    .unwrap_or_else(|| SUBMIT_REJECTED_TEXT.to_string()),
            )),
        }
    }

    async fn fetch_task(&self, id: &TaskId) -> Result<TaskSnapshot> {
        let envelope: TaskEnvelope = self.get_json(&format!("/api/tasks/{}", id)).await?;
        match envelope.task {
            Some(task) if envelope.success => Ok(task),
            _ => Err(Self::envelope_error(envelope.error, "Task unavailable")),
        }
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>> {
        let envelope: AgentsEnvelope = self.get_json("/api/agents").await?;
        if !envelope.success {
            return Err(Self::envelope_error(envelope.error, "Agent roster unavailable"));
        }
        Ok(envelope.agents)
    }

    async fn fetch_status(&self) -> Result<SystemStatus> {
        let envelope: StatusEnvelope = self.get_json("/api/status").await?;
        match envelope.status {
            Some(status) if envelope.success => Ok(status),
            _ => Err(Self::envelope_error(envelope.error, "System status unavailable")),
        }
    }

    async fn fetch_activity(&self) -> Result<Vec<ActivityEntry>> {
        let envelope: ActivityEnvelope = self.get_json("/api/activity").await?;
        if !envelope.success {
            return Err(Self::envelope_error(envelope.error, "Activity log unavailable"));
        }
        Ok(envelope.activities)
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        let envelope: HistoryEnvelope = self.get_json("/api/history").await?;
        if !envelope.success {
            return Err(Self::envelope_error(envelope.error, "Task history unavailable"));
        }
        Ok(envelope.history)
    }
}
