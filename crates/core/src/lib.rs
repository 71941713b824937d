//! # PHILOVOID Core
//!
//! Domain types, capability traits, and error definitions for the PHILOVOID
//! chat companion. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every ambient effect (network, storage, timers, identity generation) is
//! defined as a trait here. Implementations live in their respective crates.
//! This enables:
//! - Pure, deterministic context assembly and stream reduction
//! - Testing with scripted gateways, virtual clocks, and fake id sources
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod gateway;
pub mod ids;
pub mod knowledge;
pub mod message;
pub mod persona;
pub mod ritual;
pub mod scheduler;
pub mod storage;

// Re-export key types at crate root for ergonomics
pub use error::{Error, GatewayError, Result, StorageError};
pub use gateway::{FragmentStream, ModelGateway, SendOptions};
pub use ids::{IdGenerator, UuidGenerator};
pub use knowledge::{DocumentMetadata, KnowledgeDocument};
pub use message::{ConversationLog, Message, Sender, PENDING_SENTINEL};
pub use ritual::{RitualStage, RITUAL_STAGES};
pub use scheduler::{CancelToken, Scheduler};
pub use storage::Storage;
