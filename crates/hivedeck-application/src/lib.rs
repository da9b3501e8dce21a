//! Application services for the Hivedeck client.
//!
//! This crate ties the domain layer to a concrete backend: it owns the
//! submission lifecycle (submit, poll, deliver the reply), the dashboard
//! refresh loop, and the event stream the presentation layer renders from.
//!
//! # Module Structure
//!
//! - `event`: one-way event channel from the core to the presentation layer
//! - `poller`: per-task polling loop that resolves a submission to an outcome
//! - `orchestrator`: submission lifecycle and reply routing
//! - `dashboard`: periodic aggregation of agents, activity and history

pub mod dashboard;
pub mod event;
pub mod orchestrator;
pub mod poller;

// Re-export public API
pub use dashboard::{DashboardAggregator, DashboardState};
pub use event::{ClientEvent, EventReceiver, EventSender, Notice, NoticeKind};
pub use orchestrator::{ReplyRouting, TaskOrchestrator};
pub use poller::PollerHandle;
