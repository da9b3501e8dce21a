//! Dashboard domain module.
//!
//! Read-only views of the backend as a whole: the agent roster, aggregate
//! counters and the display load derived from them, the activity log, and
//! the completed task history.

mod model;

// Re-export public API
pub use model::{
    ActivityEntry, ActivityKind, Agent, AgentStatus, HistoryEntry, SystemLoad, SystemStatus,
};
