//! Conversation domain module.
//!
//! This module contains the conversation thread model, its message types,
//! and the in-memory store that owns every thread for the lifetime of the
//! process.
//!
//! # Module Structure
//!
//! - `model`: Conversation thread model (`Conversation`, `ConversationId`)
//!   and title derivation
//! - `message`: Message types (`Message`, `MessageId`, `MessageRole`)
//! - `store`: The conversation collection (`ConversationStore`)
//!
//! # Usage
//!
//! ```ignore
//! use hivedeck_core::conversation::{Conversation, ConversationId, ConversationStore};
//! use hivedeck_core::conversation::{Message, MessageId, MessageRole};
//! ```

mod message;
mod model;
mod store;

// Re-export public API
pub use message::{Message, MessageId, MessageRole};
pub use model::{Conversation, ConversationId, DEFAULT_TITLE, derive_title};
pub use store::ConversationStore;
