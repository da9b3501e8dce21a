//! Conversation domain model.
//!
//! This module contains the conversation thread entity and the title
//! derivation used when the first user message arrives.

use super::message::{Message, MessageRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Title given to a conversation before any user message arrives.
pub const DEFAULT_TITLE: &str = "New Conversation";

/// Maximum number of characters a derived title keeps.
const TITLE_MAX_CHARS: usize = 30;

/// Unique conversation identifier.
///
/// Opaque and never reused; creation order carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(Uuid);

impl ConversationId {
    /// Generates a fresh identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single conversation thread.
///
/// A conversation holds an ordered message history and a display title.
/// The title starts as a placeholder and is derived from the first user
/// message, unless it has been pinned by an explicit rename first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation identifier.
    pub id: ConversationId,
    /// Human-readable title shown in listings.
    pub title: String,
    /// Messages in chronological order.
    pub messages: Vec<Message>,
    /// Timestamp of the most recent mutation (display and sorting only).
    pub last_updated: DateTime<Utc>,
    /// Set once the title has been derived or explicitly renamed.
    ///
    /// A pinned title is never overwritten by derivation.
    #[serde(default)]
    pub title_pinned: bool,
}

impl Conversation {
    /// Creates an empty conversation with the placeholder title.
    pub fn new() -> Self {
        Self {
            id: ConversationId::new(),
            title: DEFAULT_TITLE.to_string(),
            messages: Vec::new(),
            last_updated: Utc::now(),
            title_pinned: false,
        }
    }

    /// Returns the most recent message, if any.
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// True while no user message has been appended yet.
    pub fn awaiting_first_user_message(&self) -> bool {
        !self.messages.iter().any(|m| m.role == MessageRole::User)
    }

    /// Case-insensitive match against the title or the last message text.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self
                .last_message()
                .map(|m| m.text.to_lowercase().contains(&query))
                .unwrap_or(false)
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

/// Derives a conversation title from the first user message.
///
/// Takes the first sentence (split at `.`, `!`, `?`, or a newline), trimmed
/// and truncated to 30 characters, and appends `...` whenever the full text
/// runs past 30 characters. Falls back to the whole text when the first
/// sentence is empty.
pub fn derive_title(text: &str) -> String {
    let first_sentence = text
        .split(['.', '!', '?', '\n'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(text);

    let mut title: String = first_sentence.chars().take(TITLE_MAX_CHARS).collect();
    if text.chars().count() > TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}
