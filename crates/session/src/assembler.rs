//! Context assembly — building the exact prompt string sent to the gateway.
//!
//! Two modes:
//! - **Plain**: no retrievable document is enabled; the raw prompt passes
//!   through untouched and the gateway applies the persona instruction.
//! - **Augmented**: the retrieval instruction header, every retrievable
//!   document as a START/END-delimited block, and the original prompt
//!   appended at the end. The persona instruction is suppressed because the
//!   assembled text is self-contained.
//!
//! # Determinism
//!
//! Assembly is a pure function: identical inputs always produce identical
//! output. No randomness, clocks, or I/O.

use philovoid_core::knowledge::KnowledgeDocument;
use philovoid_core::persona;

/// Whether the assembled prompt carries retrieval context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptMode {
    /// Raw prompt; the general persona instruction applies.
    Plain,
    /// Self-contained retrieval prompt; persona instruction suppressed.
    Augmented,
}

/// The result of context assembly.
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    /// The exact text to send to the gateway.
    pub text: String,
    /// Plain or augmented.
    pub mode: PromptMode,
    /// Names of documents whose blocks made it into the context.
    pub included: Vec<String>,
    /// Documents skipped by budget enforcement.
    pub dropped: Vec<DroppedDocument>,
}

impl AssembledPrompt {
    /// Whether this prompt runs in retrieval mode at the gateway.
    pub fn is_augmented(&self) -> bool {
        self.mode == PromptMode::Augmented
    }
}

/// A document excluded from the context for budget reasons.
#[derive(Debug, Clone)]
pub struct DroppedDocument {
    pub name: String,
    /// Size of the block that would have been added, in characters.
    pub chars: usize,
}

/// The context assembler. Stateless — create one and reuse it.
pub struct ContextAssembler {
    /// Character budget for the concatenated document blocks.
    budget: usize,
}

impl ContextAssembler {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    /// Assembler with the standard context budget.
    pub fn with_default_budget() -> Self {
        Self::new(persona::MAX_CONTEXT_CHARACTERS)
    }

    /// Assemble the prompt for one turn.
    ///
    /// Documents that are disabled or empty never contribute. Retrievable
    /// documents are taken in iteration order while their blocks fit the
    /// budget; overflowing documents are skipped and reported. The first
    /// retrievable document is always included so an augmented prompt never
    /// degenerates to an empty context.
    pub fn assemble(&self, prompt: &str, documents: &[KnowledgeDocument]) -> AssembledPrompt {
        let retrievable: Vec<&KnowledgeDocument> =
            documents.iter().filter(|d| d.is_retrievable()).collect();

        if retrievable.is_empty() {
            return AssembledPrompt {
                text: prompt.to_string(),
                mode: PromptMode::Plain,
                included: Vec::new(),
                dropped: Vec::new(),
            };
        }

        let mut blocks: Vec<String> = Vec::new();
        let mut included: Vec<String> = Vec::new();
        let mut dropped: Vec<DroppedDocument> = Vec::new();
        let mut used = 0usize;

        for doc in retrievable {
            let block = persona::document_block(&doc.name, &doc.content);
            let chars = block.chars().count();
            if blocks.is_empty() || used + chars <= self.budget {
                used += chars;
                included.push(doc.name.clone());
                blocks.push(block);
            } else {
                dropped.push(DroppedDocument {
                    name: doc.name.clone(),
                    chars,
                });
            }
        }

        let context_block = blocks.join("\n\n");
        let text = format!(
            "{}\n\n--- RETRIEVED CONTEXT ---\n{}\n--- END OF CONTEXT ---\n\nUser's Question: {}",
            persona::RETRIEVAL_INSTRUCTION,
            context_block,
            prompt
        );

        AssembledPrompt {
            text,
            mode: PromptMode::Augmented,
            included,
            dropped,
        }
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::with_default_budget()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use philovoid_core::knowledge::DocumentMetadata;

    fn doc(name: &str, content: &str, enabled: bool) -> KnowledgeDocument {
        let mut d = KnowledgeDocument::new(name, name, content, DocumentMetadata::fallback());
        d.enabled = enabled;
        d
    }

    #[test]
    fn no_enabled_documents_passes_prompt_through() {
        let assembler = ContextAssembler::with_default_budget();
        let docs = vec![doc("a.txt", "alpha", false)];
        let assembled = assembler.assemble("what is entropy?", &docs);
        assert_eq!(assembled.text, "what is entropy?");
        assert_eq!(assembled.mode, PromptMode::Plain);
        assert!(assembled.included.is_empty());
    }

    #[test]
    fn empty_content_counts_as_not_enabled() {
        let assembler = ContextAssembler::with_default_budget();
        let docs = vec![doc("hollow.txt", "", true)];
        let assembled = assembler.assemble("p", &docs);
        assert_eq!(assembled.mode, PromptMode::Plain);
    }

    #[test]
    fn augmented_prompt_contains_every_marker_and_the_prompt() {
        let assembler = ContextAssembler::with_default_budget();
        let docs = vec![
            doc("first.md", "one", true),
            doc("second.md", "two", true),
            doc("off.md", "ignored", false),
        ];
        let assembled = assembler.assemble("the question", &docs);

        assert_eq!(assembled.mode, PromptMode::Augmented);
        for name in ["first.md", "second.md"] {
            assert!(assembled
                .text
                .contains(&format!("--- START OF DOCUMENT: {name} ---")));
            assert!(assembled
                .text
                .contains(&format!("--- END OF DOCUMENT: {name} ---")));
        }
        assert!(!assembled.text.contains("off.md"));
        assert!(assembled.text.ends_with("User's Question: the question"));
        assert!(assembled.text.starts_with(persona::RETRIEVAL_INSTRUCTION));
    }

    #[test]
    fn document_order_follows_iteration_order() {
        let assembler = ContextAssembler::with_default_budget();
        let docs = vec![doc("zeta.md", "z", true), doc("alpha.md", "a", true)];
        let assembled = assembler.assemble("q", &docs);
        let zeta = assembled.text.find("zeta.md").unwrap();
        let alpha = assembled.text.find("alpha.md").unwrap();
        assert!(zeta < alpha);
        assert_eq!(assembled.included, vec!["zeta.md", "alpha.md"]);
    }

    #[test]
    fn budget_skips_overflowing_documents() {
        // First block is ~90 chars of framing plus content; allow one block only.
        let assembler = ContextAssembler::new(200);
        let docs = vec![
            doc("keep.md", &"x".repeat(80), true),
            doc("drop.md", &"y".repeat(80), true),
        ];
        let assembled = assembler.assemble("q", &docs);
        assert_eq!(assembled.included, vec!["keep.md"]);
        assert_eq!(assembled.dropped.len(), 1);
        assert_eq!(assembled.dropped[0].name, "drop.md");
        assert!(!assembled.text.contains("drop.md"));
    }

    #[test]
    fn first_document_is_included_even_when_oversized() {
        let assembler = ContextAssembler::new(10);
        let docs = vec![doc("huge.md", &"x".repeat(500), true)];
        let assembled = assembler.assemble("q", &docs);
        assert_eq!(assembled.included, vec!["huge.md"]);
        assert!(assembled.dropped.is_empty());
        assert_eq!(assembled.mode, PromptMode::Augmented);
    }

    #[test]
    fn assembly_is_deterministic() {
        let assembler = ContextAssembler::with_default_budget();
        let docs = vec![doc("a.md", "alpha", true), doc("b.md", "beta", true)];
        let one = assembler.assemble("same", &docs);
        let two = assembler.assemble("same", &docs);
        assert_eq!(one.text, two.text);
    }
}
