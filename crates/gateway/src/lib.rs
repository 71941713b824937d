//! # PHILOVOID Gateway
//!
//! The hosted-API client: implements [`philovoid_core::ModelGateway`]
//! against a Gemini-style generative-language REST surface.
//!
//! The provider is treated strictly as a black box that turns a prompt and
//! history into a lazy fragment stream (or a structured classification).
//! Nothing here interprets model output beyond SSE/JSON framing.

mod generative;

pub use generative::GenerativeClient;
