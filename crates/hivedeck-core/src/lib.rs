pub mod conversation;
pub mod dashboard;
pub mod error;
pub mod service;
pub mod task;

// Re-export common error type
pub use error::{HivedeckError, Result};
pub use service::TaskService;
