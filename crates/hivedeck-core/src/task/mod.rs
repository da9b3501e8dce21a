//! Task domain module.
//!
//! This module contains the types that describe a backend task as this
//! client sees it: its identifier, its reported status, the polled
//! snapshot, the terminal outcome, and the client-side in-flight state.
//!
//! # Usage
//!
//! ```ignore
//! use hivedeck_core::task::{TaskId, TaskSnapshot, TaskStatus};
//! use hivedeck_core::task::{FlightState, TaskOutcome};
//! ```

mod model;

// Re-export public API
pub use model::{FlightState, NO_RESPONSE_TEXT, TaskId, TaskOutcome, TaskSnapshot, TaskStatus};
