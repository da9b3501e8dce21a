//! HTTP interaction layer for the Hivedeck client.
//!
//! This crate owns everything about talking to the task backend over REST:
//! the connection configuration and the `TaskService` implementation. No
//! client state lives here; every call is request/response.

pub mod config;
pub mod rest_client;

// Re-export public API
pub use config::BackendConfig;
pub use rest_client::{NETWORK_ERROR_TEXT, RestTaskService, SUBMIT_REJECTED_TEXT};
