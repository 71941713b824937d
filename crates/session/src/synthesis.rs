//! The synthesis desk: dense summarization over a chosen document subset,
//! with refinement and a follow-up sub-chat scoped to the summary.
//!
//! Three operations, each its own streaming surface with its own advisory
//! pending flag and failure policy:
//! - `run` — one-shot deep synthesis into the summary buffer
//! - `refine` — re-run over the same documents with a new focus
//! - `follow_up` — question answering against the summary only, in an
//!   in-memory sub-conversation (never persisted)

use crate::reducer::{reduce, BufferSink, Observed, SubChatSink, SynthesisRun};
use philovoid_core::error::GatewayError;
use philovoid_core::gateway::{ModelGateway, SendOptions};
use philovoid_core::ids::IdGenerator;
use philovoid_core::knowledge::KnowledgeDocument;
use philovoid_core::message::Message;
use philovoid_core::persona;
use std::sync::Arc;
use tracing::{debug, info};

/// What the desk is currently doing. Advisory — drives input disabling in
/// the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Synthesizing,
    Refining,
    Answering,
}

pub struct SynthesisDesk {
    gateway: Arc<dyn ModelGateway>,
    ids: Arc<dyn IdGenerator>,
    summary: String,
    follow_up: Vec<Message>,
    activity: Activity,
}

impl SynthesisDesk {
    pub fn new(gateway: Arc<dyn ModelGateway>, ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            gateway,
            ids,
            summary: String::new(),
            follow_up: Vec::new(),
            activity: Activity::Idle,
        }
    }

    /// The synthesized summary (or the failure message of the last run).
    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn follow_up_messages(&self) -> &[Message] {
        &self.follow_up
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn is_busy(&self) -> bool {
        self.activity != Activity::Idle
    }

    fn render_documents(documents: &[&KnowledgeDocument]) -> String {
        documents
            .iter()
            .map(|d| persona::document_block(&d.name, &d.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Run the initial deep synthesis over the selected documents. Resets
    /// the summary, the refinement state, and the follow-up sub-chat.
    pub async fn run<F: FnMut(&str)>(
        &mut self,
        documents: &[&KnowledgeDocument],
        on_fragment: F,
    ) -> Result<(), GatewayError> {
        if self.is_busy() || documents.is_empty() {
            return Ok(());
        }
        self.activity = Activity::Synthesizing;
        self.summary.clear();
        self.follow_up.clear();

        info!(documents = documents.len(), "Deep synthesis started");
        let prompt = persona::deep_synthesis_prompt(&Self::render_documents(documents));
        let result = self
            .stream_into_summary(prompt, SynthesisRun::Initial, on_fragment)
            .await;
        self.activity = Activity::Idle;
        result
    }

    /// Re-synthesize the same documents around a new focus. The follow-up
    /// sub-chat keeps its history; the summary is replaced.
    pub async fn refine<F: FnMut(&str)>(
        &mut self,
        documents: &[&KnowledgeDocument],
        focus: &str,
        on_fragment: F,
    ) -> Result<(), GatewayError> {
        let focus = focus.trim();
        if self.is_busy() || documents.is_empty() || focus.is_empty() {
            return Ok(());
        }
        self.activity = Activity::Refining;
        self.summary.clear();

        info!(documents = documents.len(), focus, "Refined synthesis started");
        let prompt = persona::refined_synthesis_prompt(&Self::render_documents(documents), focus);
        let result = self
            .stream_into_summary(prompt, SynthesisRun::Refinement, on_fragment)
            .await;
        self.activity = Activity::Idle;
        result
    }

    async fn stream_into_summary<F: FnMut(&str)>(
        &mut self,
        prompt: String,
        run: SynthesisRun,
        on_fragment: F,
    ) -> Result<(), GatewayError> {
        let options = SendOptions {
            extended_reasoning: true,
            retrieval_mode: true,
        };
        let stream = match self.gateway.send(&prompt, &[], options).await {
            Ok(stream) => stream,
            Err(error) => {
                self.summary = BufferSink::failure_message(run, &error);
                return Err(error);
            }
        };

        let mut sink = Observed::new(BufferSink::new(&mut self.summary, run), on_fragment);
        reduce(stream, &mut sink).await.map(|_| ())
    }

    /// Answer a question strictly from the current summary, inside the
    /// follow-up sub-chat.
    pub async fn follow_up<F: FnMut(&str)>(
        &mut self,
        question: &str,
        on_fragment: F,
    ) -> Result<(), GatewayError> {
        let question = question.trim();
        if self.is_busy() || question.is_empty() || self.summary.is_empty() {
            return Ok(());
        }
        self.activity = Activity::Answering;

        self.follow_up
            .push(Message::user(self.ids.as_ref(), question));
        // The just-asked question is part of the history; the pending
        // placeholder is not (the gateway filters it anyway).
        let history = self.follow_up.clone();
        self.follow_up.push(Message::pending_ai(self.ids.as_ref()));

        debug!(turns = history.len(), "Follow-up question");
        let prompt = persona::follow_up_prompt(&self.summary, question);
        let options = SendOptions {
            extended_reasoning: false,
            retrieval_mode: true,
        };

        let result = match self.gateway.send(&prompt, &history, options).await {
            Ok(stream) => {
                let mut sink = Observed::new(SubChatSink::new(&mut self.follow_up), on_fragment);
                reduce(stream, &mut sink).await.map(|_| ())
            }
            Err(error) => {
                if let Some(last) = self.follow_up.last_mut() {
                    last.content = format!("Error: {error}");
                }
                Err(error)
            }
        };
        self.activity = Activity::Idle;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockGateway, SequentialIds};
    use philovoid_core::knowledge::DocumentMetadata;
    use philovoid_core::message::Sender;

    fn desk(gateway: MockGateway) -> (SynthesisDesk, Arc<MockGateway>) {
        let gateway = Arc::new(gateway);
        (
            SynthesisDesk::new(gateway.clone(), Arc::new(SequentialIds::new())),
            gateway,
        )
    }

    fn doc(name: &str, content: &str) -> KnowledgeDocument {
        KnowledgeDocument::new(name, name, content, DocumentMetadata::fallback())
    }

    #[tokio::test]
    async fn run_streams_the_summary() {
        let (mut desk, gateway) =
            desk(MockGateway::new().with_fragments(&["A dense ", "summary."]));
        let docs = [doc("a.md", "alpha"), doc("b.md", "beta")];
        let refs: Vec<&KnowledgeDocument> = docs.iter().collect();

        desk.run(&refs, |_| {}).await.unwrap();

        assert_eq!(desk.summary(), "A dense summary.");
        let sends = gateway.sends();
        assert!(sends[0].prompt.contains("--- START OF DOCUMENT: a.md ---"));
        assert!(sends[0].prompt.contains("--- END OF DOCUMENT: b.md ---"));
        assert!(sends[0].options.extended_reasoning);
        assert!(sends[0].options.retrieval_mode);
        assert!(sends[0].history.is_empty());
    }

    #[tokio::test]
    async fn run_with_no_documents_is_a_noop() {
        let (mut desk, gateway) = desk(MockGateway::new());
        desk.run(&[], |_| {}).await.unwrap();
        assert!(desk.summary().is_empty());
        assert!(gateway.sends().is_empty());
    }

    #[tokio::test]
    async fn run_failure_replaces_the_summary() {
        let (mut desk, _) = desk(MockGateway::new().with_stream(vec![
            Ok("partial".into()),
            Err(GatewayError::Network("gone".into())),
        ]));
        let docs = [doc("a.md", "alpha")];
        let refs: Vec<&KnowledgeDocument> = docs.iter().collect();

        let err = desk.run(&refs, |_| {}).await.unwrap_err();
        assert!(matches!(err, GatewayError::Network(_)));
        assert!(desk
            .summary()
            .starts_with("**Error:** Could not complete synthesis."));
        assert!(!desk.summary().contains("partial"));
    }

    #[tokio::test]
    async fn refine_uses_the_focus_and_its_own_failure_wording() {
        let (mut desk, gateway) = desk(
            MockGateway::new()
                .with_fragments(&["first pass"])
                .with_send_failure(GatewayError::Timeout("slow".into())),
        );
        let docs = [doc("a.md", "alpha")];
        let refs: Vec<&KnowledgeDocument> = docs.iter().collect();

        desk.run(&refs, |_| {}).await.unwrap();
        let err = desk.refine(&refs, "only the entropy angle", |_| {}).await;
        assert!(err.is_err());

        assert!(desk
            .summary()
            .starts_with("**Error:** Could not complete regeneration."));
        let sends = gateway.sends();
        assert!(sends[1].prompt.contains("only the entropy angle"));
    }

    #[tokio::test]
    async fn refine_with_blank_focus_is_a_noop() {
        let (mut desk, gateway) = desk(MockGateway::new().with_fragments(&["pass"]));
        let docs = [doc("a.md", "alpha")];
        let refs: Vec<&KnowledgeDocument> = docs.iter().collect();
        desk.run(&refs, |_| {}).await.unwrap();

        desk.refine(&refs, "   ", |_| {}).await.unwrap();
        assert_eq!(desk.summary(), "pass");
        assert_eq!(gateway.sends().len(), 1);
    }

    #[tokio::test]
    async fn follow_up_is_scoped_to_the_summary() {
        let (mut desk, gateway) = desk(
            MockGateway::new()
                .with_fragments(&["the summary text"])
                .with_fragments(&["an answer"]),
        );
        let docs = [doc("a.md", "alpha")];
        let refs: Vec<&KnowledgeDocument> = docs.iter().collect();
        desk.run(&refs, |_| {}).await.unwrap();

        desk.follow_up("what does it say?", |_| {}).await.unwrap();

        let sends = gateway.sends();
        assert!(sends[1].prompt.contains("the summary text"));
        assert!(sends[1].prompt.contains("what does it say?"));
        assert!(!sends[1].options.extended_reasoning);

        let messages = desk.follow_up_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].sender, Sender::User);
        assert_eq!(messages[1].content, "an answer");
    }

    #[tokio::test]
    async fn follow_up_without_a_summary_is_a_noop() {
        let (mut desk, gateway) = desk(MockGateway::new());
        desk.follow_up("premature", |_| {}).await.unwrap();
        assert!(desk.follow_up_messages().is_empty());
        assert!(gateway.sends().is_empty());
    }

    #[tokio::test]
    async fn follow_up_failure_keeps_the_ai_sender() {
        let (mut desk, _) = desk(
            MockGateway::new()
                .with_fragments(&["summary"])
                .with_stream(vec![Err(GatewayError::Network("offline".into()))]),
        );
        let docs = [doc("a.md", "alpha")];
        let refs: Vec<&KnowledgeDocument> = docs.iter().collect();
        desk.run(&refs, |_| {}).await.unwrap();

        let err = desk.follow_up("q", |_| {}).await;
        assert!(err.is_err());

        let last = desk.follow_up_messages().last().unwrap();
        assert_eq!(last.sender, Sender::Ai);
        assert!(last.content.starts_with("Error: "));
    }

    #[tokio::test]
    async fn a_new_run_resets_the_follow_up_chat() {
        let (mut desk, _) = desk(
            MockGateway::new()
                .with_fragments(&["summary one"])
                .with_fragments(&["answer"])
                .with_fragments(&["summary two"]),
        );
        let docs = [doc("a.md", "alpha")];
        let refs: Vec<&KnowledgeDocument> = docs.iter().collect();

        desk.run(&refs, |_| {}).await.unwrap();
        desk.follow_up("q", |_| {}).await.unwrap();
        assert_eq!(desk.follow_up_messages().len(), 2);

        desk.run(&refs, |_| {}).await.unwrap();
        assert!(desk.follow_up_messages().is_empty());
        assert_eq!(desk.summary(), "summary two");
    }
}
