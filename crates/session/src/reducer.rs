//! Stream reduction — folding a fragment stream into a message slot.
//!
//! The reducer consumes the gateway's lazy fragment sequence and updates a
//! slot after every fragment, so an observer of the slot sees monotonically
//! growing content. Fragments are applied strictly in arrival order; none
//! are reordered or dropped.
//!
//! On failure the accumulated partial content is discarded: the slot is
//! overwritten with a surface-specific human-readable message. Each chat
//! surface (main conversation, synthesis buffer, follow-up sub-chat) brings
//! its own [`StreamSink`] with its own failure policy, and concurrent
//! reductions never share a buffer.

use crate::conversation::ConversationStore;
use philovoid_core::error::GatewayError;
use philovoid_core::gateway::FragmentStream;
use philovoid_core::message::Message;

/// A slot adapter: where accumulated content lands, and what happens to the
/// slot when the stream fails.
pub trait StreamSink {
    /// Called after every fragment with the full accumulated content and
    /// the fragment that was just applied.
    fn update(&mut self, accumulated: &str, fragment: &str);

    /// Called once if the stream fails. The slot must end up holding a
    /// human-readable message, not partial content.
    fn fail(&mut self, error: &GatewayError);
}

/// Drain a fragment stream into a sink.
///
/// Returns the full concatenation on success, or the upstream error after
/// the sink's failure hook has rewritten the slot.
pub async fn reduce(
    mut fragments: FragmentStream,
    sink: &mut dyn StreamSink,
) -> Result<String, GatewayError> {
    let mut accumulated = String::new();
    while let Some(item) = fragments.recv().await {
        match item {
            Ok(fragment) => {
                accumulated.push_str(&fragment);
                sink.update(&accumulated, &fragment);
            }
            Err(error) => {
                sink.fail(&error);
                return Err(error);
            }
        }
    }
    Ok(accumulated)
}

/// Failure text for the main conversation.
pub fn chat_failure_message(error: &GatewayError) -> String {
    format!("Error: Could not reach the void. {error}")
}

/// Wraps a sink and additionally reports each raw fragment to a callback.
/// The presentation layer streams output to the terminal through this.
pub struct Observed<S, F> {
    inner: S,
    on_fragment: F,
}

impl<S: StreamSink, F: FnMut(&str)> Observed<S, F> {
    pub fn new(inner: S, on_fragment: F) -> Self {
        Self { inner, on_fragment }
    }
}

impl<S: StreamSink, F: FnMut(&str)> StreamSink for Observed<S, F> {
    fn update(&mut self, accumulated: &str, fragment: &str) {
        self.inner.update(accumulated, fragment);
        (self.on_fragment)(fragment);
    }

    fn fail(&mut self, error: &GatewayError) {
        self.inner.fail(error);
    }
}

// ── Surface sinks ─────────────────────────────────────────────────────────

/// Main-conversation sink: the slot is the last message of the persisted
/// log. Failure rewrites the slot as a System message so it reads as a
/// notice, not model output.
pub struct ChatTurnSink<'a> {
    store: &'a mut ConversationStore,
}

impl<'a> ChatTurnSink<'a> {
    pub fn new(store: &'a mut ConversationStore) -> Self {
        Self { store }
    }
}

impl StreamSink for ChatTurnSink<'_> {
    fn update(&mut self, accumulated: &str, _fragment: &str) {
        self.store.replace_last_content(accumulated);
    }

    fn fail(&mut self, error: &GatewayError) {
        self.store
            .replace_last_with_system(chat_failure_message(error));
    }
}

/// Follow-up sub-chat sink: the slot is the last message of an in-memory
/// sub-log. Failure keeps the sender as-is.
pub struct SubChatSink<'a> {
    log: &'a mut Vec<Message>,
}

impl<'a> SubChatSink<'a> {
    pub fn new(log: &'a mut Vec<Message>) -> Self {
        Self { log }
    }

    fn set_last(&mut self, content: String) {
        if let Some(last) = self.log.last_mut() {
            last.content = content;
        }
    }
}

impl StreamSink for SubChatSink<'_> {
    fn update(&mut self, accumulated: &str, _fragment: &str) {
        self.set_last(accumulated.to_string());
    }

    fn fail(&mut self, error: &GatewayError) {
        self.set_last(format!("Error: {error}"));
    }
}

/// Which synthesis operation a buffer sink is serving; selects the failure
/// wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisRun {
    Initial,
    Refinement,
}

/// Synthesis sink: the slot is a plain growing buffer rendered in the
/// synthesis panel.
pub struct BufferSink<'a> {
    buffer: &'a mut String,
    run: SynthesisRun,
}

impl<'a> BufferSink<'a> {
    pub fn new(buffer: &'a mut String, run: SynthesisRun) -> Self {
        Self { buffer, run }
    }

    pub(crate) fn failure_message(run: SynthesisRun, error: &GatewayError) -> String {
        match run {
            SynthesisRun::Initial => {
                format!("**Error:** Could not complete synthesis. {error}")
            }
            SynthesisRun::Refinement => {
                format!("**Error:** Could not complete regeneration. {error}")
            }
        }
    }
}

impl StreamSink for BufferSink<'_> {
    fn update(&mut self, accumulated: &str, _fragment: &str) {
        self.buffer.clear();
        self.buffer.push_str(accumulated);
    }

    fn fail(&mut self, error: &GatewayError) {
        *self.buffer = Self::failure_message(self.run, error);
    }
}
