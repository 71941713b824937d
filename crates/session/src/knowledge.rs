//! The knowledge library.
//!
//! Uploaded documents plus session-only view state: a selection set for
//! synthesis runs and a sort order for the folder-grouped display. The
//! selection set and sort order are never persisted.

use philovoid_core::gateway::ModelGateway;
use philovoid_core::ids::IdGenerator;
use philovoid_core::knowledge::{DocumentMetadata, KnowledgeDocument};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Folder label for documents whose classification produced no folder.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// What the library view sorts by, within each folder group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Lexicographic by name; ascending by default.
    Name,
    /// By upload time; newest first by default.
    CreatedAt,
    /// Enabled documents first by default.
    Enabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Sort key and direction are orthogonal toggle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self {
            key: SortKey::Name,
            direction: SortDirection::Asc,
        }
    }
}

impl SortOrder {
    /// Selecting the active key flips the direction; selecting a new key
    /// resets to that key's default direction.
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = match self.direction {
                SortDirection::Asc => SortDirection::Desc,
                SortDirection::Desc => SortDirection::Asc,
            };
        } else {
            *self = Self {
                key,
                direction: SortDirection::Asc,
            };
        }
    }
}

/// A file handed to [`KnowledgeStore::ingest`].
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub content: String,
}

pub struct KnowledgeStore {
    documents: Vec<KnowledgeDocument>,
    selected: HashSet<String>,
    sort: SortOrder,
    ids: Arc<dyn IdGenerator>,
}

impl KnowledgeStore {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            documents: Vec::new(),
            selected: HashSet::new(),
            sort: SortOrder::default(),
            ids,
        }
    }

    pub fn documents(&self) -> &[KnowledgeDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn enabled_count(&self) -> usize {
        self.documents.iter().filter(|d| d.enabled).count()
    }

    /// Ingest a batch of uploaded files, classifying each via the gateway.
    ///
    /// Any classification failure yields the fallback metadata for that one
    /// file — a batch of N files always produces N entries and never
    /// aborts. Returns the ids of the new documents.
    pub async fn ingest(
        &mut self,
        uploads: Vec<Upload>,
        gateway: &dyn ModelGateway,
    ) -> Vec<String> {
        let mut new_ids = Vec::with_capacity(uploads.len());

        for upload in uploads {
            let metadata = match gateway.classify(&upload.content).await {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(file = %upload.name, error = %e, "Classification failed, using fallback");
                    DocumentMetadata::fallback()
                }
            };

            let id = self.ids.generate();
            debug!(file = %upload.name, folder = %metadata.folder, "Document ingested");
            self.documents.push(KnowledgeDocument::new(
                id.clone(),
                upload.name,
                upload.content,
                metadata,
            ));
            new_ids.push(id);
        }

        new_ids
    }

    /// Flip a document's retrieval eligibility. Returns false for an
    /// unknown id.
    pub fn toggle_enabled(&mut self, id: &str) -> bool {
        match self.documents.iter_mut().find(|d| d.id == id) {
            Some(doc) => {
                doc.enabled = !doc.enabled;
                true
            }
            None => false,
        }
    }

    /// Flip a document's synthesis-selection flag. Returns false for an
    /// unknown id.
    pub fn toggle_selected(&mut self, id: &str) -> bool {
        if !self.documents.iter().any(|d| d.id == id) {
            return false;
        }
        if !self.selected.remove(id) {
            self.selected.insert(id.to_string());
        }
        true
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn selection_count(&self) -> usize {
        self.selected.len()
    }

    /// Documents eligible for context assembly, in collection order.
    pub fn enabled_documents(&self) -> Vec<&KnowledgeDocument> {
        self.documents.iter().filter(|d| d.enabled).collect()
    }

    /// Documents marked for a synthesis run, in collection order.
    pub fn selected_documents(&self) -> Vec<&KnowledgeDocument> {
        self.documents
            .iter()
            .filter(|d| self.selected.contains(&d.id))
            .collect()
    }

    /// Remove one document; its selection entry goes with it.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.documents.len();
        self.documents.retain(|d| d.id != id);
        self.selected.remove(id);
        self.documents.len() < before
    }

    /// Drop the whole library. The document collection and the selection
    /// set are emptied together, so no selected id can outlive its
    /// document.
    pub fn clear(&mut self) {
        self.documents.clear();
        self.selected.clear();
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
    }

    /// The folder-grouped, sorted library view. Folders are listed
    /// alphabetically; documents within each folder follow the current sort
    /// order. Documents without a folder land in the
    /// [`UNCATEGORIZED`] bucket.
    pub fn grouped(&self) -> Vec<(String, Vec<&KnowledgeDocument>)> {
        let mut groups: BTreeMap<String, Vec<&KnowledgeDocument>> = BTreeMap::new();
        for doc in &self.documents {
            let folder = if doc.folder.is_empty() {
                UNCATEGORIZED.to_string()
            } else {
                doc.folder.clone()
            };
            groups.entry(folder).or_default().push(doc);
        }

        let sort = self.sort;
        groups
            .into_iter()
            .map(|(folder, mut docs)| {
                docs.sort_by(|a, b| Self::compare(sort, a, b));
                (folder, docs)
            })
            .collect()
    }

    fn compare(sort: SortOrder, a: &KnowledgeDocument, b: &KnowledgeDocument) -> Ordering {
        let ordering = match sort.key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            // Newest first is this key's ascending default.
            SortKey::CreatedAt => b.created_at.cmp(&a.created_at),
            // Enabled first is this key's ascending default.
            SortKey::Enabled => b.enabled.cmp(&a.enabled),
        };
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}
