use async_trait::async_trait;
use hivedeck_application::event::{self, ClientEvent, EventReceiver};
use hivedeck_application::{DashboardAggregator, TaskOrchestrator};
use hivedeck_core::conversation::{ConversationStore, MessageRole};
use hivedeck_core::dashboard::{ActivityEntry, Agent, HistoryEntry, SystemStatus};
use hivedeck_core::task::{TaskId, TaskSnapshot, TaskStatus};
use hivedeck_core::{HivedeckError, Result, TaskService};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const POLL: Duration = Duration::from_millis(5);
const DEBOUNCE: Duration = Duration::from_millis(1);

/// Backend double that serves a scripted sequence of task snapshots and
/// counts every read endpoint call.
struct ScriptedBackend {
    snapshots: Mutex<VecDeque<Result<TaskSnapshot>>>,
    fetch_calls: AtomicUsize,
    agents_calls: AtomicUsize,
    history_calls: AtomicUsize,
}

impl ScriptedBackend {
    fn new(snapshots: Vec<Result<TaskSnapshot>>) -> Arc<Self> {
        Arc::new(Self {
            snapshots: Mutex::new(snapshots.into()),
            fetch_calls: AtomicUsize::new(0),
            agents_calls: AtomicUsize::new(0),
            history_calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TaskService for ScriptedBackend {
    async fn submit_task(&self, _text: &str) -> Result<TaskId> {
        Ok(TaskId::new("task-1"))
    }

    async fn fetch_task(&self, id: &TaskId) -> Result<TaskSnapshot> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.snapshots.lock().unwrap().pop_front();
        match next {
            Some(snapshot) => snapshot,
            None => Ok(processing(id.as_str())),
        }
    }

    async fn fetch_agents(&self) -> Result<Vec<Agent>> {
        self.agents_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }

    async fn fetch_status(&self) -> Result<SystemStatus> {
        Ok(SystemStatus::default())
    }

    async fn fetch_activity(&self) -> Result<Vec<ActivityEntry>> {
        Ok(Vec::new())
    }

    async fn fetch_history(&self) -> Result<Vec<HistoryEntry>> {
        self.history_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Vec::new())
    }
}

fn processing(id: &str) -> TaskSnapshot {
    TaskSnapshot {
        id: TaskId::new(id),
        description: None,
        status: TaskStatus::Processing,
        result: None,
        error: None,
        created_at: None,
        completed_at: None,
    }
}

fn completed(id: &str, result: &str) -> TaskSnapshot {
    TaskSnapshot {
        result: Some(result.to_string()),
        status: TaskStatus::Completed,
        ..processing(id)
    }
}

async fn next_assistant_text(rx: &mut EventReceiver) -> String {
    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .expect("timed out waiting for an event")
            .expect("event channel closed");
        if let ClientEvent::AssistantMessage { text, .. } = event {
            return text;
        }
    }
}

#[tokio::test]
async fn test_submission_resolves_into_one_assistant_reply() {
    let backend = ScriptedBackend::new(vec![
        Ok(processing("task-1")),
        Ok(completed("task-1", "Research finished")),
    ]);
    let store = Arc::new(ConversationStore::new());
    let (events, mut rx) = event::channel();
    let orchestrator = Arc::new(TaskOrchestrator::new(
        store.clone(),
        backend.clone(),
        events.clone(),
        POLL,
    ));
    let aggregator = Arc::new(DashboardAggregator::new(
        backend.clone(),
        events,
        DEBOUNCE,
        POLL,
    ));
    orchestrator.attach_dashboard(aggregator.clone()).await;
    store.create().await;

    orchestrator.submit("Research the competitors").await;
    let reply = next_assistant_text(&mut rx).await;
    assert_eq!(reply, "Research finished");

    let conversation = store.current().await.expect("conversation exists");
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, MessageRole::User);
    assert_eq!(conversation.messages[1].role, MessageRole::Assistant);
    assert_eq!(conversation.title, "Research the competitors");
    assert!(!orchestrator.is_in_flight().await);

    // Completion triggers the one-shot history refresh.
    assert_eq!(backend.history_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_terminal_event_fires_at_most_once() {
    // Even with terminal snapshots still queued behind the first one, the
    // poller must stop at the first terminal status it sees.
    let backend = ScriptedBackend::new(vec![
        Ok(processing("task-1")),
        Ok(completed("task-1", "first")),
        Ok(completed("task-1", "second")),
        Ok(completed("task-1", "third")),
    ]);
    let store = Arc::new(ConversationStore::new());
    let (events, mut rx) = event::channel();
    let orchestrator = Arc::new(TaskOrchestrator::new(
        store.clone(),
        backend.clone(),
        events,
        POLL,
    ));
    store.create().await;

    orchestrator.submit("only once").await;
    let reply = next_assistant_text(&mut rx).await;
    assert_eq!(reply, "first");

    // Give would-be extra ticks ample time to fire.
    tokio::time::sleep(POLL * 10).await;

    assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 2);
    let conversation = store.current().await.expect("conversation exists");
    assert_eq!(conversation.messages.len(), 2);
    while let Ok(event) = rx.try_recv() {
        assert!(
            matches!(event, ClientEvent::Notice(_)),
            "no second assistant reply may arrive"
        );
    }
}

#[tokio::test]
async fn test_transient_poll_failure_recovers_silently() {
    let backend = ScriptedBackend::new(vec![
        Err(HivedeckError::fetch("connection reset")),
        Ok(processing("task-1")),
        Ok(completed("task-1", "made it")),
    ]);
    let store = Arc::new(ConversationStore::new());
    let (events, mut rx) = event::channel();
    let orchestrator = Arc::new(TaskOrchestrator::new(
        store.clone(),
        backend.clone(),
        events,
        POLL,
    ));
    store.create().await;

    orchestrator.submit("ride out the blip").await;
    let reply = next_assistant_text(&mut rx).await;
    assert_eq!(reply, "made it");

    // The failed tick left no trace in the conversation.
    let conversation = store.current().await.expect("conversation exists");
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(backend.fetch_calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_dashboard_loop_follows_the_flight_watch() {
    // Keep the task in flight for a handful of ticks before completing.
    let backend = ScriptedBackend::new(vec![
        Ok(processing("task-1")),
        Ok(processing("task-1")),
        Ok(processing("task-1")),
        Ok(processing("task-1")),
        Ok(completed("task-1", "done")),
    ]);
    let store = Arc::new(ConversationStore::new());
    let (events, mut rx) = event::channel();
    let orchestrator = Arc::new(TaskOrchestrator::new(
        store.clone(),
        backend.clone(),
        events.clone(),
        POLL,
    ));
    let aggregator = Arc::new(DashboardAggregator::new(
        backend.clone(),
        events,
        DEBOUNCE,
        POLL,
    ));
    orchestrator.attach_dashboard(aggregator.clone()).await;
    aggregator.start(orchestrator.watch_in_flight()).await;
    store.create().await;

    orchestrator.submit("keep the dashboard busy").await;
    next_assistant_text(&mut rx).await;

    // In-flight ticks refreshed the roster beyond the initial refresh.
    assert!(backend.agents_calls.load(Ordering::SeqCst) >= 2);

    // Once idle, the loop goes quiet.
    tokio::time::sleep(POLL * 4).await;
    let frozen = backend.agents_calls.load(Ordering::SeqCst);
    tokio::time::sleep(POLL * 8).await;
    assert_eq!(backend.agents_calls.load(Ordering::SeqCst), frozen);

    aggregator.stop().await;
}
