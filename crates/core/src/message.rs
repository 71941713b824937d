//! Message and ConversationLog domain types.
//!
//! These are the core value objects that flow through the system:
//! user submits a prompt → a Message enters the log → the gateway streams a
//! response → the last message's content grows until the stream completes.

use crate::ids::IdGenerator;
use serde::{Deserialize, Serialize};

/// Placeholder content for a message whose response has not produced its
/// first fragment yet. The presentation layer renders this as a loading
/// indicator; the gateway filters it out of API history.
pub const PENDING_SENTINEL: &str = "...";

/// Id of the seeded placeholder message present in every fresh log.
pub const SEED_MESSAGE_ID: &str = "initial";

/// Content of the seeded placeholder message.
pub const SEED_MESSAGE: &str = "Awaiting transmission. The recursive loop is live.";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The end user
    User,
    /// The model
    Ai,
    /// System notices: the seed line, koans, and failure messages
    System,
}

/// A single message in a conversation.
///
/// Content is mutable while a response streams; messages are never deleted
/// individually, only via a full log reset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message ID
    pub id: String,

    /// Who sent this message
    pub sender: Sender,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(ids: &dyn IdGenerator, content: impl Into<String>) -> Self {
        Self {
            id: ids.generate(),
            sender: Sender::User,
            content: content.into(),
        }
    }

    /// Create a new AI message holding the pending placeholder.
    pub fn pending_ai(ids: &dyn IdGenerator) -> Self {
        Self {
            id: ids.generate(),
            sender: Sender::Ai,
            content: PENDING_SENTINEL.into(),
        }
    }

    /// Create a new system message.
    pub fn system(ids: &dyn IdGenerator, content: impl Into<String>) -> Self {
        Self {
            id: ids.generate(),
            sender: Sender::System,
            content: content.into(),
        }
    }

    /// The fixed seed message every fresh log starts with.
    pub fn seed() -> Self {
        Self {
            id: SEED_MESSAGE_ID.into(),
            sender: Sender::System,
            content: SEED_MESSAGE.into(),
        }
    }

    /// Whether this message still holds the pending placeholder.
    pub fn is_pending(&self) -> bool {
        self.content == PENDING_SENTINEL
    }
}

/// An ordered log of messages. Insertion order is significant.
///
/// Invariant: never empty — a fresh or malformed log is seeded with one
/// placeholder System message. Append-only, except that the last element's
/// content may be replaced while a response streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationLog {
    messages: Vec<Message>,
}

impl ConversationLog {
    /// Create a log holding only the seed message.
    pub fn seeded() -> Self {
        Self {
            messages: vec![Message::seed()],
        }
    }

    /// Restore a log from persisted messages; empty input falls back to the
    /// seeded log so the non-empty invariant holds.
    pub fn from_messages(messages: Vec<Message>) -> Self {
        if messages.is_empty() {
            Self::seeded()
        } else {
            Self { messages }
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Append a message to the end of the log.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Replace the content of the last message in place.
    pub fn replace_last_content(&mut self, content: impl Into<String>) {
        if let Some(last) = self.messages.last_mut() {
            last.content = content.into();
        }
    }

    /// Replace the last message's content and flip its sender to System.
    /// Used to visually distinguish a failed response from model output.
    pub fn replace_last_with_system(&mut self, content: impl Into<String>) {
        if let Some(last) = self.messages.last_mut() {
            last.content = content.into();
            last.sender = Sender::System;
        }
    }

    /// Drop everything and return to the seeded state.
    pub fn reset(&mut self) {
        self.messages = vec![Message::seed()];
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }
}

impl Default for ConversationLog {
    fn default() -> Self {
        Self::seeded()
    }
}
