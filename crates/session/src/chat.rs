//! The main conversation surface: one user turn from prompt to reduced
//! response.
//!
//! A turn appends the user message and a pending AI placeholder, assembles
//! the context from the enabled library documents, sends it through the
//! gateway, and reduces the fragment stream into the placeholder slot. Any
//! failure — before the first fragment or mid-stream — resolves to a
//! System-sender error message in that slot and never touches other state.

use crate::assembler::ContextAssembler;
use crate::conversation::ConversationStore;
use crate::reducer::{chat_failure_message, reduce, ChatTurnSink, Observed};
use philovoid_core::error::GatewayError;
use philovoid_core::gateway::{ModelGateway, SendOptions};
use philovoid_core::knowledge::KnowledgeDocument;
use philovoid_core::message::Message;
use philovoid_core::persona;
use std::sync::Arc;
use tracing::{debug, info};

pub struct ChatSession {
    store: ConversationStore,
    gateway: Arc<dyn ModelGateway>,
    assembler: ContextAssembler,
    deep_thought: bool,
    /// Advisory admission control: the input surface is disabled while a
    /// turn is in flight. Not a hard mutual-exclusion invariant.
    pending: bool,
}

impl ChatSession {
    pub fn new(store: ConversationStore, gateway: Arc<dyn ModelGateway>) -> Self {
        Self {
            store,
            gateway,
            assembler: ContextAssembler::with_default_budget(),
            deep_thought: false,
            pending: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn deep_thought(&self) -> bool {
        self.deep_thought
    }

    /// Toggle extended-reasoning mode; returns the new state.
    pub fn toggle_deep_thought(&mut self) -> bool {
        self.deep_thought = !self.deep_thought;
        self.deep_thought
    }

    /// Run one turn. `on_fragment` observes each raw fragment as it
    /// arrives (streaming display).
    ///
    /// Returns the final response text; on failure the error has already
    /// been written into the response slot as a System message.
    pub async fn send_message<F: FnMut(&str)>(
        &mut self,
        prompt: &str,
        documents: &[KnowledgeDocument],
        on_fragment: F,
    ) -> Result<String, GatewayError> {
        if self.pending {
            debug!("Turn ignored: another turn is in flight");
            return Ok(String::new());
        }
        self.pending = true;
        let result = self.run_turn(prompt, documents, on_fragment).await;
        self.pending = false;
        result
    }

    async fn run_turn<F: FnMut(&str)>(
        &mut self,
        prompt: &str,
        documents: &[KnowledgeDocument],
        on_fragment: F,
    ) -> Result<String, GatewayError> {
        // History is the log before this turn's messages enter it.
        let history = self.store.history();

        self.store.append_user(prompt);
        self.store.append_pending_ai();

        let assembled = self.assembler.assemble(prompt, documents);
        info!(
            mode = ?assembled.mode,
            documents = assembled.included.len(),
            dropped = assembled.dropped.len(),
            "Context assembled"
        );

        let options = SendOptions {
            extended_reasoning: self.deep_thought,
            retrieval_mode: assembled.is_augmented(),
        };

        let stream = match self.gateway.send(&assembled.text, &history, options).await {
            Ok(stream) => stream,
            Err(error) => {
                self.store
                    .replace_last_with_system(chat_failure_message(&error));
                return Err(error);
            }
        };

        let mut sink = Observed::new(ChatTurnSink::new(&mut self.store), on_fragment);
        reduce(stream, &mut sink).await
    }

    /// Post a System message (koan delivery and similar notices).
    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.store.append_system(content);
    }

    /// Post a randomly drawn koan. The index comes from the caller so this
    /// layer stays deterministic.
    pub fn add_koan(&mut self, index: usize) {
        let koan = persona::KOANS[index % persona::KOANS.len()];
        self.add_system_message(persona::koan_message(koan));
    }

    /// Reset the conversation to the seeded log.
    pub fn clear(&mut self) {
        self.store.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockGateway, SequentialIds};
    use philovoid_core::ids::{IdGenerator, UuidGenerator};
    use philovoid_core::knowledge::DocumentMetadata;
    use philovoid_core::message::Sender;
    use philovoid_core::storage::MemoryStorage;

    fn session(gateway: MockGateway) -> ChatSession {
        let store = ConversationStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(SequentialIds::new()),
        );
        ChatSession::new(store, Arc::new(gateway))
    }

    fn doc(name: &str, content: &str, enabled: bool) -> KnowledgeDocument {
        let ids = UuidGenerator;
        let mut d = KnowledgeDocument::new(
            ids.generate(),
            name,
            content,
            DocumentMetadata::fallback(),
        );
        d.enabled = enabled;
        d
    }

    #[tokio::test]
    async fn a_turn_appends_user_and_streamed_response() {
        let gateway = MockGateway::new().with_fragments(&["The void ", "listens."]);
        let mut session = session(gateway);

        let response = session.send_message("speak", &[], |_| {}).await.unwrap();

        assert_eq!(response, "The void listens.");
        let messages = session.messages();
        assert_eq!(messages.len(), 3); // seed + user + response
        assert_eq!(messages[1].sender, Sender::User);
        assert_eq!(messages[1].content, "speak");
        assert_eq!(messages[2].sender, Sender::Ai);
        assert_eq!(messages[2].content, "The void listens.");
    }

    #[tokio::test]
    async fn history_excludes_the_current_turn() {
        let gateway = Arc::new(
            MockGateway::new()
                .with_fragments(&["first"])
                .with_fragments(&["second"]),
        );
        let store = ConversationStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(SequentialIds::new()),
        );
        let mut session = ChatSession::new(store, gateway.clone());

        session.send_message("one", &[], |_| {}).await.unwrap();
        session.send_message("two", &[], |_| {}).await.unwrap();

        let sends = gateway.sends();
        // First turn saw only the seed; second turn saw seed + turn one.
        assert_eq!(sends[0].history.len(), 1);
        assert_eq!(sends[1].history.len(), 3);
        assert!(sends[1].history.iter().any(|m| m.content == "one"));
        assert!(sends[1].history.iter().any(|m| m.content == "first"));
        assert!(!sends[1].history.iter().any(|m| m.content == "two"));
    }

    #[tokio::test]
    async fn plain_turn_sends_raw_prompt() {
        let gateway = Arc::new(MockGateway::new().with_fragments(&["ok"]));
        let store = ConversationStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(SequentialIds::new()),
        );
        let mut session = ChatSession::new(store, gateway.clone());

        session.send_message("just a question", &[], |_| {}).await.unwrap();

        let sends = gateway.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].prompt, "just a question");
        assert!(!sends[0].options.retrieval_mode);
        // History was the seeded log only.
        assert_eq!(sends[0].history.len(), 1);
    }

    #[tokio::test]
    async fn augmented_turn_sends_assembled_context() {
        let gateway = Arc::new(MockGateway::new().with_fragments(&["cited answer"]));
        let store = ConversationStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(SequentialIds::new()),
        );
        let mut session = ChatSession::new(store, gateway.clone());
        let docs = vec![doc("vault.md", "the vault text", true)];

        session.send_message("what is in the vault?", &docs, |_| {}).await.unwrap();

        let sends = gateway.sends();
        assert!(sends[0].options.retrieval_mode);
        assert!(sends[0].prompt.contains("--- START OF DOCUMENT: vault.md ---"));
        assert!(sends[0]
            .prompt
            .ends_with("User's Question: what is in the vault?"));
    }

    #[tokio::test]
    async fn deep_thought_requests_extended_reasoning() {
        let gateway = Arc::new(MockGateway::new().with_fragments(&["deep"]));
        let store = ConversationStore::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(SequentialIds::new()),
        );
        let mut session = ChatSession::new(store, gateway.clone());

        assert!(session.toggle_deep_thought());
        session.send_message("ponder", &[], |_| {}).await.unwrap();

        assert!(gateway.sends()[0].options.extended_reasoning);
    }

    #[tokio::test]
    async fn mid_stream_failure_becomes_a_system_message() {
        let gateway = MockGateway::new().with_stream(vec![
            Ok("partial".into()),
            Err(GatewayError::StreamInterrupted("reset".into())),
        ]);
        let mut session = session(gateway);

        let err = session.send_message("q", &[], |_| {}).await.unwrap_err();
        assert!(matches!(err, GatewayError::StreamInterrupted(_)));

        let last = session.messages().last().unwrap();
        assert_eq!(last.sender, Sender::System);
        assert!(last.content.starts_with("Error: Could not reach the void."));
        assert!(!last.content.contains("partial"));
    }

    #[tokio::test]
    async fn pre_stream_failure_becomes_a_system_message() {
        let gateway = MockGateway::new().with_send_failure(GatewayError::MissingCredential);
        let mut session = session(gateway);

        let err = session.send_message("q", &[], |_| {}).await.unwrap_err();
        assert!(matches!(err, GatewayError::MissingCredential));

        let last = session.messages().last().unwrap();
        assert_eq!(last.sender, Sender::System);
        assert!(last.content.contains("API key not found"));
    }

    #[tokio::test]
    async fn fragments_are_observed_in_order() {
        let gateway = MockGateway::new().with_fragments(&["a", "b", "c"]);
        let mut session = session(gateway);

        let mut seen = Vec::new();
        session
            .send_message("q", &[], |fragment| seen.push(fragment.to_string()))
            .await
            .unwrap();
        assert_eq!(seen, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn koans_are_posted_as_system_messages() {
        let gateway = MockGateway::new();
        let mut session = session(gateway);

        session.add_koan(2);
        let last = session.messages().last().unwrap();
        assert_eq!(last.sender, Sender::System);
        assert!(last.content.starts_with("A Koan from the Void: \""));
    }

    #[tokio::test]
    async fn clear_returns_to_the_seeded_log() {
        let gateway = MockGateway::new().with_fragments(&["reply"]);
        let mut session = session(gateway);
        session.send_message("q", &[], |_| {}).await.unwrap();
        assert!(session.messages().len() > 1);

        session.clear();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].sender, Sender::System);
    }
}
