//! In-memory conversation collection.
//!
//! The store owns every conversation thread and the "current" selection.
//! Mutations rebuild the conversation list and swap it in under the write
//! lock, so a snapshot handed out earlier never observes a partial change.
//! Nothing here is persisted; the collection lives and dies with the
//! process.

use std::sync::Arc;
use tokio::sync::RwLock;

use super::message::{Message, MessageId, MessageRole};
use super::model::{Conversation, ConversationId, derive_title};

/// Interior state guarded by the store lock.
struct StoreState {
    /// Shared snapshot of all conversations, most recently created first.
    conversations: Arc<Vec<Conversation>>,
    /// The conversation new submissions target.
    current: Option<ConversationId>,
    /// Next message id to allocate.
    next_message_id: u64,
}

/// Holds every conversation thread for the lifetime of the process.
///
/// `ConversationStore` is responsible for:
/// - Creating new conversations (prepended and selected)
/// - Switching the current selection
/// - Renaming and deleting conversations
/// - Appending messages and deriving the title from the first user message
///
/// All methods take `&self`; the store is shared as `Arc<ConversationStore>`.
pub struct ConversationStore {
    state: RwLock<StoreState>,
}

impl ConversationStore {
    /// Creates an empty store with no current conversation.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState {
                conversations: Arc::new(Vec::new()),
                current: None,
                next_message_id: 0,
            }),
        }
    }

    /// Creates a new conversation, makes it current, and returns its id.
    ///
    /// The new conversation is prepended so listings show newest first.
    pub async fn create(&self) -> ConversationId {
        let mut state = self.state.write().await;
        let conversation = Conversation::new();
        let id = conversation.id;

        let mut conversations = state.conversations.as_ref().clone();
        conversations.insert(0, conversation);
        state.conversations = Arc::new(conversations);
        state.current = Some(id);
        id
    }

    /// Makes `id` the current conversation.
    ///
    /// Unknown ids leave the selection untouched.
    ///
    /// # Returns
    ///
    /// `true` if the conversation exists and was selected.
    pub async fn select(&self, id: ConversationId) -> bool {
        let mut state = self.state.write().await;
        let known = state.conversations.iter().any(|c| c.id == id);
        if known {
            state.current = Some(id);
        }
        known
    }

    /// Removes a conversation.
    ///
    /// When the removed conversation was current, the selection falls back
    /// to the first remaining conversation, or to none if the store is now
    /// empty.
    ///
    /// # Returns
    ///
    /// `true` if a conversation was removed.
    pub async fn delete(&self, id: ConversationId) -> bool {
        let mut state = self.state.write().await;
        let remaining: Vec<Conversation> = state
            .conversations
            .iter()
            .filter(|c| c.id != id)
            .cloned()
            .collect();

        if remaining.len() == state.conversations.len() {
            return false;
        }

        if state.current == Some(id) {
            state.current = remaining.first().map(|c| c.id);
        }
        state.conversations = Arc::new(remaining);
        true
    }

    /// Overwrites a conversation's title.
    ///
    /// The new title is pinned: it survives the first user message instead
    /// of being replaced by derivation.
    ///
    /// # Returns
    ///
    /// `true` if the conversation exists.
    pub async fn rename(&self, id: ConversationId, title: impl Into<String>) -> bool {
        let title = title.into();
        let mut state = self.state.write().await;
        let mut conversations = state.conversations.as_ref().clone();
        let Some(conversation) = conversations.iter_mut().find(|c| c.id == id) else {
            return false;
        };

        conversation.title = title;
        conversation.title_pinned = true;
        conversation.last_updated = chrono::Utc::now();
        state.conversations = Arc::new(conversations);
        true
    }

    /// Appends a message to a conversation.
    ///
    /// The first user message also sets the conversation title (unless a
    /// rename pinned it first). Appends to unknown conversations are
    /// ignored; the caller decides whether that matters.
    ///
    /// # Returns
    ///
    /// The id of the appended message, or `None` for unknown conversations.
    pub async fn append(
        &self,
        id: ConversationId,
        role: MessageRole,
        text: impl Into<String>,
    ) -> Option<MessageId> {
        let text = text.into();
        let mut state = self.state.write().await;
        let mut conversations = state.conversations.as_ref().clone();
        let conversation = conversations.iter_mut().find(|c| c.id == id)?;

        if role == MessageRole::User
            && !conversation.title_pinned
            && conversation.awaiting_first_user_message()
        {
            conversation.title = derive_title(&text);
            conversation.title_pinned = true;
        }

        let message_id = MessageId(state.next_message_id);
        state.next_message_id += 1;

        conversation.messages.push(Message::new(message_id, role, text));
        conversation.last_updated = chrono::Utc::now();
        state.conversations = Arc::new(conversations);
        Some(message_id)
    }

    /// Filters conversations by title or last message text.
    ///
    /// Matching is case-insensitive; a blank query returns everything in
    /// listing order.
    pub async fn search(&self, query: &str) -> Vec<Conversation> {
        let state = self.state.read().await;
        let query = query.trim();
        if query.is_empty() {
            return state.conversations.as_ref().clone();
        }
        state
            .conversations
            .iter()
            .filter(|c| c.matches_query(query))
            .cloned()
            .collect()
    }

    /// Returns the current conversation list as a shared snapshot.
    ///
    /// The snapshot is immutable; later mutations swap in a new list and
    /// never touch one already handed out.
    pub async fn snapshot(&self) -> Arc<Vec<Conversation>> {
        self.state.read().await.conversations.clone()
    }

    /// Returns the id of the current conversation.
    pub async fn current_id(&self) -> Option<ConversationId> {
        self.state.read().await.current
    }

    /// Returns a copy of the current conversation.
    pub async fn current(&self) -> Option<Conversation> {
        let state = self.state.read().await;
        let id = state.current?;
        state.conversations.iter().find(|c| c.id == id).cloned()
    }

    /// Returns a copy of a conversation by id.
    pub async fn get(&self, id: ConversationId) -> Option<Conversation> {
        self.state
            .read()
            .await
            .conversations
            .iter()
            .find(|c| c.id == id)
            .cloned()
    }

    /// Number of conversations in the store.
    pub async fn len(&self) -> usize {
        self.state.read().await.conversations.len()
    }

    /// True when the store holds no conversations.
    pub async fn is_empty(&self) -> bool {
        self.state.read().await.conversations.is_empty()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}
