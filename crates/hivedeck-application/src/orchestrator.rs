//! Submission lifecycle.
//!
//! The orchestrator owns the only genuinely shared mutable state in the
//! client: the flight state and the poller bound to it. At most one task is
//! in flight at a time. A submission appends the user message immediately,
//! binds the backend task id to a poller, and later appends exactly one
//! assistant message when the poller resolves.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, watch};

use hivedeck_core::TaskService;
use hivedeck_core::conversation::{ConversationId, ConversationStore, MessageRole};
use hivedeck_core::task::{FlightState, TaskOutcome};

use crate::dashboard::DashboardAggregator;
use crate::event::{ClientEvent, EventSender, Notice};
use crate::poller::{self, PollerHandle};

/// Which conversation receives the assistant reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplyRouting {
    /// The conversation that was current at submission time.
    #[default]
    SubmitTime,
    /// Whichever conversation is current when the outcome arrives.
    CompletionTime,
}

/// Drives a task from submission to its single terminal message.
pub struct TaskOrchestrator {
    store: Arc<ConversationStore>,
    service: Arc<dyn TaskService>,
    events: EventSender,
    flight: RwLock<FlightState>,
    poller: Mutex<Option<PollerHandle>>,
    in_flight_tx: watch::Sender<bool>,
    dashboard: RwLock<Option<Arc<DashboardAggregator>>>,
    routing: ReplyRouting,
    poll_interval: Duration,
}

impl TaskOrchestrator {
    /// Creates an orchestrator with submit-time reply routing.
    pub fn new(
        store: Arc<ConversationStore>,
        service: Arc<dyn TaskService>,
        events: EventSender,
        poll_interval: Duration,
    ) -> Self {
        let (in_flight_tx, _) = watch::channel(false);
        Self {
            store,
            service,
            events,
            flight: RwLock::new(FlightState::Idle),
            poller: Mutex::new(None),
            in_flight_tx,
            dashboard: RwLock::new(None),
            routing: ReplyRouting::SubmitTime,
            poll_interval,
        }
    }

    /// Overrides where assistant replies land.
    pub fn with_routing(mut self, routing: ReplyRouting) -> Self {
        self.routing = routing;
        self
    }

    /// Watch channel mirroring `is_in_flight`, for the dashboard loop.
    pub fn watch_in_flight(&self) -> watch::Receiver<bool> {
        self.in_flight_tx.subscribe()
    }

    /// Attaches the aggregator whose history refreshes on task completion.
    pub async fn attach_dashboard(&self, dashboard: Arc<DashboardAggregator>) {
        *self.dashboard.write().await = Some(dashboard);
    }

    /// Submits task text to the backend and binds a poller to the result.
    ///
    /// No-op when the text is blank or a task is already in flight. The user
    /// message is appended to the current conversation before the network
    /// call, and that conversation is captured as the reply target under
    /// submit-time routing. On submission failure the error's display text
    /// is appended as the assistant reply and no poller is started.
    pub async fn submit(self: &Arc<Self>, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!(target: "orchestrator", "Ignoring blank submission");
            return;
        }

        {
            let mut flight = self.flight.write().await;
            if flight.is_in_flight() {
                tracing::debug!(target: "orchestrator", "Rejecting submission: a task is already in flight");
                return;
            }
            *flight = FlightState::Submitting;
        }
        let _ = self.in_flight_tx.send(true);

        // No conversation yet means the submission starts one.
        let conversation = match self.store.current_id().await {
            Some(id) => id,
            None => self.store.create().await,
        };
        self.store
            .append(conversation, MessageRole::User, text)
            .await;
        self.notify(Notice::info("Task submitted to agents"));

        match self.service.submit_task(text).await {
            Ok(task_id) => {
                tracing::info!(target: "orchestrator", "Task {} accepted", task_id);
                let (handle, outcome_rx) =
                    poller::spawn(self.service.clone(), task_id.clone(), self.poll_interval);
                *self.flight.write().await = FlightState::Polling(task_id);
                *self.poller.lock().await = Some(handle);
                self.notify(Notice::success("Task processing started"));

                let orchestrator = Arc::clone(self);
                tokio::spawn(async move {
                    // A cancelled poller closes the channel instead.
                    if let Ok(outcome) = outcome_rx.await {
                        orchestrator.finish(conversation, outcome).await;
                    }
                });
            }
            Err(e) => {
                tracing::warn!(target: "orchestrator", "Submission failed: {}", e);
                self.append_assistant(conversation, e.user_message()).await;
                self.clear_flight().await;
            }
        }
    }

    /// Cancels an active poller and returns to `Idle`.
    ///
    /// No terminal message is appended for a cancelled task. A submission
    /// still on the wire is not interrupted; it binds normally.
    pub async fn cancel_in_flight(&self) {
        {
            let mut flight = self.flight.write().await;
            match &*flight {
                FlightState::Polling(id) => {
                    tracing::info!(target: "orchestrator", "Cancelling poll for task {}", id);
                }
                _ => return,
            }
            *flight = FlightState::Idle;
        }
        let _ = self.in_flight_tx.send(false);
        if let Some(handle) = self.poller.lock().await.take() {
            handle.stopped().await;
        }
    }

    /// Current flight state, by clone.
    pub async fn flight(&self) -> FlightState {
        self.flight.read().await.clone()
    }

    /// True from submission until the terminal event (or a cancel) lands.
    pub async fn is_in_flight(&self) -> bool {
        self.flight.read().await.is_in_flight()
    }

    /// Applies the poller's terminal outcome.
    ///
    /// The outcome is discarded when the orchestrator no longer has that
    /// task bound, which happens after a cancel.
    async fn finish(&self, submitted_in: ConversationId, outcome: TaskOutcome) {
        {
            let mut flight = self.flight.write().await;
            match flight.task_id() {
                Some(bound) if *bound == outcome.task_id => {}
                _ => {
                    tracing::debug!(target: "orchestrator", "Discarding outcome for unbound task {}", outcome.task_id);
                    return;
                }
            }
            *flight = FlightState::Idle;
        }
        let _ = self.in_flight_tx.send(false);
        self.poller.lock().await.take();

        let conversation = match self.routing {
            ReplyRouting::SubmitTime => Some(submitted_in),
            ReplyRouting::CompletionTime => self.store.current_id().await,
        };
        if let Some(conversation) = conversation {
            self.append_assistant(conversation, outcome.message_text())
                .await;
        }

        if outcome.is_success() {
            self.notify(Notice::success("Task completed successfully!"));
            if let Some(dashboard) = self.dashboard.read().await.clone() {
                dashboard.refresh_history().await;
            }
        } else {
            let reason = outcome
                .error
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("Unknown error");
            self.notify(Notice::error(format!("Task failed: {reason}")));
        }
    }

    /// Appends an assistant message and announces it.
    ///
    /// A conversation deleted while the task was in flight swallows its
    /// reply; the store ignores appends to unknown ids.
    async fn append_assistant(&self, conversation: ConversationId, text: String) {
        match self
            .store
            .append(conversation, MessageRole::Assistant, text.clone())
            .await
        {
            Some(message) => {
                let _ = self.events.send(ClientEvent::AssistantMessage {
                    conversation,
                    message,
                    text,
                });
            }
            None => {
                tracing::debug!(target: "orchestrator", "Dropping reply to deleted conversation {}", conversation);
            }
        }
    }

    async fn clear_flight(&self) {
        *self.flight.write().await = FlightState::Idle;
        let _ = self.in_flight_tx.send(false);
    }

    fn notify(&self, notice: Notice) {
        let _ = self.events.send(ClientEvent::Notice(notice));
    }
}
