//! Dashboard aggregation.
//!
//! Best-effort, read-only view of the backend: agents, derived load,
//! activity log and task history, refreshed on a timer and held as one
//! snapshot. A failed refresh keeps the previous snapshot and surfaces a
//! transient notice; it never stops the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use hivedeck_core::TaskService;
use hivedeck_core::dashboard::{ActivityEntry, Agent, HistoryEntry, SystemLoad, SystemStatus};

use crate::event::{ClientEvent, EventSender, Notice};

/// Snapshot of everything the dashboard renders.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    /// Known backend agents.
    pub agents: Vec<Agent>,
    /// Aggregate counters as last reported.
    pub status: SystemStatus,
    /// Display load derived from `status`.
    pub load: SystemLoad,
    /// Recent activity log entries.
    pub activity: Vec<ActivityEntry>,
    /// Completed task history.
    pub history: Vec<HistoryEntry>,
}

/// Fetches sections and folds them into the shared snapshot.
///
/// Cloneable so the background loop can own one without keeping the
/// aggregator itself alive.
#[derive(Clone)]
struct Refresher {
    service: Arc<dyn TaskService>,
    events: EventSender,
    snapshot: Arc<RwLock<DashboardState>>,
}

impl Refresher {
    async fn refresh_all(&self) {
        self.refresh_roster().await;
        self.refresh_activity().await;
        self.refresh_history().await;
    }

    /// Agents and counters refresh together; load is derived from the
    /// counters, so updating them separately would tear the view.
    async fn refresh_roster(&self) {
        match tokio::join!(self.service.fetch_agents(), self.service.fetch_status()) {
            (Ok(agents), Ok(status)) => {
                let mut snapshot = self.snapshot.write().await;
                snapshot.load = SystemLoad::from_status(&status);
                snapshot.agents = agents;
                snapshot.status = status;
            }
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(target: "dashboard", "System data refresh failed: {}", e);
                self.notify(Notice::error("Failed to fetch system data"));
            }
        }
    }

    async fn refresh_activity(&self) {
        match self.service.fetch_activity().await {
            Ok(activity) => self.snapshot.write().await.activity = activity,
            Err(e) => {
                tracing::warn!(target: "dashboard", "Activity refresh failed: {}", e);
                self.notify(Notice::error("Failed to fetch activity log"));
            }
        }
    }

    async fn refresh_history(&self) {
        match self.service.fetch_history().await {
            Ok(history) => self.snapshot.write().await.history = history,
            Err(e) => {
                tracing::warn!(target: "dashboard", "History refresh failed: {}", e);
                self.notify(Notice::error("Failed to fetch task history"));
            }
        }
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(ClientEvent::Notice(notice));
    }
}

struct Lifecycle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

/// Periodic, in-flight-gated refresher over the backend's read endpoints.
pub struct DashboardAggregator {
    refresher: Refresher,
    lifecycle: Mutex<Option<Lifecycle>>,
    debounce: Duration,
    poll_interval: Duration,
}

impl DashboardAggregator {
    pub fn new(
        service: Arc<dyn TaskService>,
        events: EventSender,
        debounce: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            refresher: Refresher {
                service,
                events,
                snapshot: Arc::new(RwLock::new(DashboardState::default())),
            },
            lifecycle: Mutex::new(None),
            debounce,
            poll_interval,
        }
    }

    /// Spawns the refresh loop: one debounced initial refresh of every
    /// section, then a roster+activity refresh per period while the watch
    /// channel reports a task in flight.
    ///
    /// No-op when the loop is already running.
    pub async fn start(&self, in_flight_rx: watch::Receiver<bool>) {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.is_some() {
            tracing::debug!(target: "dashboard", "Refresh loop already running");
            return;
        }

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let refresher = self.refresher.clone();
        let debounce = self.debounce;
        let period = self.poll_interval;

        let task = tokio::spawn(async move {
            // Startup bursts collapse into a single initial refresh.
            tokio::select! {
                _ = shutdown_rx.changed() => return,
                _ = tokio::time::sleep(debounce) => {}
            }
            refresher.refresh_all().await;

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        // Idle backends do not move; skip the fetch.
                        if !*in_flight_rx.borrow() {
                            continue;
                        }
                        refresher.refresh_roster().await;
                        refresher.refresh_activity().await;
                    }
                }
            }
            tracing::debug!(target: "dashboard", "Refresh loop stopped");
        });

        *lifecycle = Some(Lifecycle { shutdown_tx, task });
    }

    /// Stops the refresh loop and waits for it to wind down. Idempotent.
    pub async fn stop(&self) {
        let lifecycle = self.lifecycle.lock().await.take();
        if let Some(lifecycle) = lifecycle {
            let _ = lifecycle.shutdown_tx.send(true);
            let _ = lifecycle.task.await;
        }
    }

    /// Refreshes every section at once.
    pub async fn refresh_all(&self) {
        self.refresher.refresh_all().await;
    }

    /// Refreshes agents and counters together.
    pub async fn refresh_roster(&self) {
        self.refresher.refresh_roster().await;
    }

    /// Refreshes the activity log.
    pub async fn refresh_activity(&self) {
        self.refresher.refresh_activity().await;
    }

    /// Refreshes the completed task history.
    pub async fn refresh_history(&self) {
        self.refresher.refresh_history().await;
    }

    /// Current snapshot, by clone.
    pub async fn state(&self) -> DashboardState {
        self.refresher.snapshot.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{self, NoticeKind};
    use async_trait::async_trait;
    use hivedeck_core::dashboard::{ActivityKind, AgentStatus};
    use hivedeck_core::task::{TaskId, TaskSnapshot, TaskStatus};
    use hivedeck_core::{HivedeckError, Result};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct FixedService {
        agents_calls: AtomicUsize,
        status_calls: AtomicUsize,
        activity_calls: AtomicUsize,
        history_calls: AtomicUsize,
        fail_activity: AtomicBool,
    }

    impl FixedService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                agents_calls: AtomicUsize::new(0),
                status_calls: AtomicUsize::new(0),
                activity_calls: AtomicUsize::new(0),
                history_calls: AtomicUsize::new(0),
                fail_activity: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl TaskService for FixedService {
        async fn submit_task(&self, _text: &str) -> Result<TaskId> {
            Err(HivedeckError::internal("read-only test service"))
        }

        async fn fetch_task(&self, _id: &TaskId) -> Result<TaskSnapshot> {
            Err(HivedeckError::internal("read-only test service"))
        }

        async fn fetch_agents(&self) -> Result<Vec<Agent>> {
            self.agents_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Agent {
                id: "coordinator".to_string(),
                name: "Coordinator".to_string(),
                status: AgentStatus::Active,
                kind: "coordinator".to_string(),
                description: String::new(),
                capabilities: vec!["planning".to_string()],
            }])
        }

        async fn fetch_status(&self) -> Result<SystemStatus> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            Ok(SystemStatus {
                active_agents: 2,
                idle_agents: 2,
                total_agents: 4,
                active_tasks: 1,
                total_completed_tasks: 7,
                total_failed_tasks: 1,
            })
        }

        async fn fetch_activity(&self) -> Result<Vec<ActivityEntry>> {
            self.activity_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_activity.load(Ordering::SeqCst) {
                return Err(HivedeckError::fetch("Activity log unavailable"));
            }
            Ok(vec![ActivityEntry {
                id: "a-1".to_string(),
                timestamp: "2026-01-05T10:00:00Z".to_string(),
                agent: "System".to_string(),
                action: "Task started".to_string(),
                kind: ActivityKind::Info,
                task_id: None,
            }])
        }

        async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![HistoryEntry {
                id: "t-1".to_string(),
                task: "Summarize the backlog".to_string(),
                timestamp: "2026-01-05T09:00:00Z".to_string(),
                status: TaskStatus::Completed,
                result: Some("Done".to_string()),
            }])
        }
    }

    fn aggregator(service: Arc<FixedService>) -> (DashboardAggregator, event::EventReceiver) {
        let (events, event_rx) = event::channel();
        let aggregator = DashboardAggregator::new(
            service,
            events,
            Duration::from_millis(1),
            Duration::from_millis(10),
        );
        (aggregator, event_rx)
    }

    #[tokio::test]
    async fn test_refresh_all_populates_snapshot() {
        let service = FixedService::new();
        let (aggregator, _rx) = aggregator(service);

        aggregator.refresh_all().await;

        let state = aggregator.state().await;
        assert_eq!(state.agents.len(), 1);
        assert_eq!(state.status.total_agents, 4);
        assert_eq!(state.load.cpu_usage, 50);
        assert_eq!(state.load.memory_usage, 60);
        assert_eq!(state.activity.len(), 1);
        assert_eq!(state.history.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_section_keeps_previous_snapshot() {
        let service = FixedService::new();
        let (aggregator, mut rx) = aggregator(service.clone());

        aggregator.refresh_all().await;
        service.fail_activity.store(true, Ordering::SeqCst);
        aggregator.refresh_activity().await;

        // Previous entries survive the failed refresh.
        let state = aggregator.state().await;
        assert_eq!(state.activity.len(), 1);

        let mut saw_notice = false;
        while let Ok(event) = rx.try_recv() {
            if let ClientEvent::Notice(notice) = event {
                if notice.kind == NoticeKind::Error {
                    assert_eq!(notice.text, "Failed to fetch activity log");
                    saw_notice = true;
                }
            }
        }
        assert!(saw_notice);
    }

    #[tokio::test]
    async fn test_loop_refreshes_only_while_in_flight() {
        let service = FixedService::new();
        let (aggregator, _rx) = aggregator(service.clone());
        let (in_flight_tx, in_flight_rx) = watch::channel(false);

        aggregator.start(in_flight_rx).await;
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Only the debounced initial refresh has run.
        assert_eq!(service.agents_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.history_calls.load(Ordering::SeqCst), 1);

        let _ = in_flight_tx.send(true);
        tokio::time::sleep(Duration::from_millis(60)).await;

        // Roster and activity tick along; history stays one-shot.
        assert!(service.agents_calls.load(Ordering::SeqCst) >= 2);
        assert!(service.activity_calls.load(Ordering::SeqCst) >= 2);
        assert_eq!(service.history_calls.load(Ordering::SeqCst), 1);

        aggregator.stop().await;
    }

    #[tokio::test]
    async fn test_stop_halts_the_loop() {
        let service = FixedService::new();
        let (aggregator, _rx) = aggregator(service.clone());
        let (_in_flight_tx, in_flight_rx) = watch::channel(true);

        aggregator.start(in_flight_rx).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        aggregator.stop().await;

        let frozen = service.agents_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(service.agents_calls.load(Ordering::SeqCst), frozen);
    }

    #[tokio::test]
    async fn test_start_twice_keeps_one_loop() {
        let service = FixedService::new();
        let (aggregator, _rx) = aggregator(service.clone());
        let (_in_flight_tx, in_flight_rx) = watch::channel(true);

        aggregator.start(in_flight_rx.clone()).await;
        aggregator.start(in_flight_rx).await;
        tokio::time::sleep(Duration::from_millis(40)).await;

        // One stop() kills everything that was started.
        aggregator.stop().await;
        let frozen = service.agents_calls.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(service.agents_calls.load(Ordering::SeqCst), frozen);
    }
}
