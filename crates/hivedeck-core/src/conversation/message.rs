//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation,
//! including roles and message content.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a message within the store.
///
/// Allocated from a store-wide monotonic counter, so two appends can never
/// collide no matter how close together they land.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    /// Message from the user.
    User,
    /// Message from the agent backend, including its error text.
    Assistant,
}

/// A single message in a conversation history.
///
/// Messages are append-only: once in a conversation they are never edited
/// or removed individually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Store-unique message identifier.
    pub id: MessageId,
    /// The role of the message sender.
    pub role: MessageRole,
    /// The content of the message.
    pub text: String,
    /// Local wall-clock time of the append, formatted for display (HH:MM).
    pub timestamp: String,
}

impl Message {
    /// Creates a message stamped with the current local time.
    pub fn new(id: MessageId, role: MessageRole, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: Local::now().format("%H:%M").to_string(),
        }
    }
}
