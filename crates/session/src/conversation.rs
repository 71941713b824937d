//! The persisted conversation store.
//!
//! Wraps a [`ConversationLog`] with the injected [`Storage`] capability:
//! the log is loaded once at construction (malformed or empty snapshots
//! fall back to the seeded log) and written back after every mutation.
//! Persistence is best-effort — a failed save is logged and otherwise
//! ignored, and never rolls back the in-memory mutation.

use philovoid_core::ids::IdGenerator;
use philovoid_core::message::{ConversationLog, Message};
use philovoid_core::storage::Storage;
use std::sync::Arc;
use tracing::warn;

pub struct ConversationStore {
    log: ConversationLog,
    storage: Arc<dyn Storage>,
    ids: Arc<dyn IdGenerator>,
}

impl ConversationStore {
    /// Load the store from persisted state, seeding a fresh log when the
    /// snapshot is absent, empty, or unreadable.
    pub fn new(storage: Arc<dyn Storage>, ids: Arc<dyn IdGenerator>) -> Self {
        let log = match storage.load() {
            Ok(Some(blob)) => match serde_json::from_str::<ConversationLog>(&blob) {
                Ok(log) if !log.is_empty() => log,
                Ok(_) => ConversationLog::seeded(),
                Err(e) => {
                    warn!(error = %e, "Discarding malformed conversation snapshot");
                    ConversationLog::seeded()
                }
            },
            Ok(None) => ConversationLog::seeded(),
            Err(e) => {
                warn!(error = %e, "Failed to load conversation snapshot");
                ConversationLog::seeded()
            }
        };

        Self { log, storage, ids }
    }

    pub fn log(&self) -> &ConversationLog {
        &self.log
    }

    pub fn messages(&self) -> &[Message] {
        self.log.messages()
    }

    /// Snapshot of the current messages, e.g. as gateway history for a turn.
    pub fn history(&self) -> Vec<Message> {
        self.log.messages().to_vec()
    }

    /// Append a user message; returns its id.
    pub fn append_user(&mut self, content: impl Into<String>) -> String {
        let message = Message::user(self.ids.as_ref(), content);
        let id = message.id.clone();
        self.log.push(message);
        self.persist();
        id
    }

    /// Append an AI message holding the pending placeholder; returns its id.
    pub fn append_pending_ai(&mut self) -> String {
        let message = Message::pending_ai(self.ids.as_ref());
        let id = message.id.clone();
        self.log.push(message);
        self.persist();
        id
    }

    /// Append a System message (seed notices, koans).
    pub fn append_system(&mut self, content: impl Into<String>) -> String {
        let message = Message::system(self.ids.as_ref(), content);
        let id = message.id.clone();
        self.log.push(message);
        self.persist();
        id
    }

    /// Replace the last message's content in place (streaming updates).
    pub fn replace_last_content(&mut self, content: impl Into<String>) {
        self.log.replace_last_content(content);
        self.persist();
    }

    /// Replace the last message with a System-sender failure notice.
    pub fn replace_last_with_system(&mut self, content: impl Into<String>) {
        self.log.replace_last_with_system(content);
        self.persist();
    }

    /// Reset to the seeded log.
    pub fn reset(&mut self) {
        self.log.reset();
        self.persist();
    }

    fn persist(&self) {
        let blob = match serde_json::to_string(&self.log) {
            Ok(blob) => blob,
            Err(e) => {
                warn!(error = %e, "Failed to serialize conversation log");
                return;
            }
        };
        if let Err(e) = self.storage.save(&blob) {
            warn!(error = %e, "Failed to persist conversation log");
        }
    }
}
