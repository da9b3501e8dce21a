//! Client event stream.
//!
//! Events flow one way, from the application services to whatever layer is
//! presenting them. The channel is unbounded so emitters never block; if no
//! receiver is attached the events are dropped.

use hivedeck_core::conversation::{ConversationId, MessageId};
use tokio::sync::mpsc;

/// Sender half shared by every service that emits client events.
pub type EventSender = mpsc::UnboundedSender<ClientEvent>;

/// Receiver half held by the presentation layer.
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Creates the client event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Severity of a transient notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// A short-lived notification for the user.
///
/// Notices never mutate conversation state; they are the toast equivalent
/// of the client and may be rendered or ignored freely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Events pushed from the application services to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// An assistant reply was appended to a conversation.
    AssistantMessage {
        conversation: ConversationId,
        message: MessageId,
        text: String,
    },
    /// A transient notification.
    Notice(Notice),
}
