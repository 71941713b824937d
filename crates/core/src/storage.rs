//! Storage capability — the opaque blob store behind the conversation log.
//!
//! The log is persisted as a single serialized snapshot under a fixed
//! location, read once at startup and overwritten after every mutation.
//! Writes are synchronous and best-effort: callers log a failure and move
//! on, they never roll back the in-memory mutation.

use crate::error::StorageError;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::debug;

/// An opaque key-less blob store: one slot, load it all or save it all.
pub trait Storage: Send + Sync {
    /// Read the stored snapshot. `None` when nothing has been stored yet.
    fn load(&self) -> Result<Option<String>, StorageError>;

    /// Overwrite the stored snapshot.
    fn save(&self, blob: &str) -> Result<(), StorageError>;
}

/// File-backed storage: one file, created on first write.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Default snapshot location: `~/.philovoid/conversation.json`.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".philovoid").join("conversation.json")
    }
}

impl Storage for FileStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(&self.path) {
            Ok(blob) => Ok(Some(blob)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::Read(e.to_string())),
        }
    }

    fn save(&self, blob: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StorageError::Write(format!("create {}: {e}", parent.display())))?;
        }
        std::fs::write(&self.path, blob)
            .map_err(|e| StorageError::Write(format!("write {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), bytes = blob.len(), "Snapshot saved");
        Ok(())
    }
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load the slot, as if a previous session had saved it.
    pub fn with_blob(blob: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(blob.into())),
        }
    }
}

impl Storage for MemoryStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.slot.lock().expect("storage lock poisoned").clone())
    }

    fn save(&self, blob: &str) -> Result<(), StorageError> {
        *self.slot.lock().expect("storage lock poisoned") = Some(blob.to_string());
        Ok(())
    }
}
