//! # PHILOVOID Session
//!
//! The repo-internal logic of the chat companion: assembling augmented
//! prompts from the knowledge library, folding fragment streams into
//! message slots, the persisted conversation store, the knowledge library,
//! the synthesis desk, and the cyclic ritual stage motor.
//!
//! Everything here is driven through the capability traits defined in
//! `philovoid-core` (gateway, storage, scheduler, id generation), so each
//! component is testable with scripted doubles and a virtual clock.

pub mod assembler;
pub mod chat;
pub mod conversation;
pub mod knowledge;
pub mod reducer;
pub mod ritual;
pub mod sched_tokio;
pub mod synthesis;

#[cfg(test)]
pub(crate) mod test_support;

pub use assembler::{AssembledPrompt, ContextAssembler, PromptMode};
pub use chat::ChatSession;
pub use conversation::ConversationStore;
pub use knowledge::{KnowledgeStore, SortDirection, SortKey, SortOrder};
pub use reducer::{reduce, StreamSink};
pub use ritual::StageMotor;
pub use sched_tokio::TokioScheduler;
pub use synthesis::SynthesisDesk;
