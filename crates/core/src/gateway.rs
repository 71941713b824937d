//! ModelGateway trait — the abstraction over the hosted model provider.
//!
//! A gateway knows how to send an assembled prompt (plus prior turns) to the
//! hosted API and hand back a lazy stream of text fragments, and how to
//! classify an uploaded document into folder/tags metadata.
//!
//! The provider is a black box: no inference happens in this repository.

use crate::error::GatewayError;
use crate::knowledge::DocumentMetadata;
use crate::message::Message;
use async_trait::async_trait;

/// A lazy sequence of incremental text fragments from one model call.
///
/// The stream may fail at any point, including before the first fragment.
/// Once started it runs to completion or failure; there is no mid-flight
/// cancellation primitive.
pub type FragmentStream = tokio::sync::mpsc::Receiver<Result<String, GatewayError>>;

/// Per-call options for a gateway send.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendOptions {
    /// Route to the deep model with an extended reasoning budget.
    pub extended_reasoning: bool,

    /// The prompt carries self-contained retrieval instructions; the
    /// general persona instruction is suppressed.
    pub retrieval_mode: bool,
}

/// The core gateway trait.
///
/// Implementations convert `history` to the provider's wire format, dropping
/// System messages and pending placeholders along the way.
#[async_trait]
pub trait ModelGateway: Send + Sync {
    /// A human-readable name for this gateway (e.g. "generative-language").
    fn name(&self) -> &str;

    /// Send a prompt and get back a fragment stream.
    ///
    /// Fails fast with [`GatewayError::MissingCredential`] before any
    /// network attempt when no API key is configured.
    async fn send(
        &self,
        prompt: &str,
        history: &[Message],
        options: SendOptions,
    ) -> Result<FragmentStream, GatewayError>;

    /// Classify a document's text into folder/tags metadata.
    ///
    /// Input is truncated to [`crate::persona::CLASSIFY_INPUT_LIMIT`]
    /// characters. Transport and parse failures resolve to
    /// [`DocumentMetadata::fallback`] rather than an error, so one bad
    /// document never sinks an upload batch.
    async fn classify(&self, document_text: &str) -> Result<DocumentMetadata, GatewayError>;
}
