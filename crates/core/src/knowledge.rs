//! Knowledge document domain types.
//!
//! A knowledge document is an uploaded text file plus the classification
//! metadata the model assigned to it. `enabled` controls whether the
//! document is eligible for retrieval-augmented prompting; selection for
//! synthesis runs is session-only state held by the library, not here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification result for an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Thematic folder name (e.g. "Ontological Frameworks")
    pub folder: String,

    /// Key entities, concepts, and themes
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocumentMetadata {
    /// The fixed fallback used when classification fails for any reason,
    /// so a single bad document never blocks the rest of an upload batch.
    pub fn fallback() -> Self {
        Self {
            folder: "Uncategorized".into(),
            tags: vec!["analysis-failed".into()],
        }
    }
}

/// An uploaded document in the knowledge library.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique document ID
    pub id: String,

    /// Original file name (also the citation label)
    pub name: String,

    /// Full text content
    pub content: String,

    /// Derived classification label; groups the library view
    pub folder: String,

    /// Derived tag labels
    #[serde(default)]
    pub tags: Vec<String>,

    /// Whether this document is eligible for context assembly
    pub enabled: bool,

    /// Upload timestamp
    pub created_at: DateTime<Utc>,
}

impl KnowledgeDocument {
    /// Create a document from uploaded content and its classification.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
        metadata: DocumentMetadata,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            content: content.into(),
            folder: metadata.folder,
            tags: metadata.tags,
            enabled: true,
            created_at: Utc::now(),
        }
    }

    /// Whether this document contributes to an augmented prompt:
    /// enabled and actually carrying text.
    pub fn is_retrievable(&self) -> bool {
        self.enabled && !self.content.is_empty()
    }
}
