//! Identity generation capability.
//!
//! Message and document ids come from an injected generator rather than a
//! global function, keeping the assembly and reduction paths deterministic
//! under test.

/// Produces unique string identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Production generator: random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}
