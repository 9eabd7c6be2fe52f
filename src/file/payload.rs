//! File payload state

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, PoisonError};

use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::document::{Document, Value};

/// Source of payload content that has not been written yet
#[derive(Debug, Clone, PartialEq)]
pub enum PendingSource {
    /// Upload from a file on the local filesystem
    Path(PathBuf),
    /// Upload from memory
    Bytes(Vec<u8>),
}

/// Handle to a file persisted in the chunked store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Identifier of the file document
    pub id: Value,
    /// Collection holding the file documents
    pub collection: String,
    /// The file document as known when the handle was made
    pub metadata: Document,
}

impl StoredFile {
    pub fn new(id: Value, collection: impl Into<String>, metadata: Document) -> Self {
        Self {
            id,
            collection: collection.into(),
            metadata,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        self.metadata.get_str("filename")
    }

    pub fn length(&self) -> Option<i64> {
        self.metadata.get("length").and_then(Value::as_i64)
    }

    pub fn chunk_size(&self) -> Option<i64> {
        self.metadata.get("chunkSize").and_then(Value::as_i64)
    }

    pub fn upload_date(&self) -> Option<&str> {
        self.metadata.get_str("uploadDate")
    }

    pub fn checksum(&self) -> Option<&str> {
        self.metadata.get_str("checksum")
    }

    /// SHA-256 hex digest used as the stored checksum
    pub fn calculate_checksum(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }
}

/// The three states a payload can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadState {
    /// Content pending, never stored
    Unpersisted,
    /// Stored and unchanged since
    Persisted,
    /// Stored before, new content pending
    DirtyPersisted,
}

#[derive(Debug, Default)]
struct FileState {
    pending: Option<PendingSource>,
    stored: Option<StoredFile>,
    dirty: bool,
}

/// A binary large object attached to a document.
///
/// Clones share state: when the payload is stored, every document holding
/// a clone observes the refreshed handle.
#[derive(Clone)]
pub struct FilePayload {
    state: Arc<RwLock<FileState>>,
}

impl FilePayload {
    fn with_state(state: FileState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// New payload uploaded from memory
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_state(FileState {
            pending: Some(PendingSource::Bytes(bytes.into())),
            stored: None,
            dirty: true,
        })
    }

    /// New payload uploaded from a local file
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        Self::with_state(FileState {
            pending: Some(PendingSource::Path(path.as_ref().to_path_buf())),
            stored: None,
            dirty: true,
        })
    }

    /// Payload for a file already in the store
    pub fn from_stored(file: StoredFile) -> Self {
        Self::with_state(FileState {
            pending: None,
            stored: Some(file),
            dirty: false,
        })
    }

    fn read(&self) -> RwLockReadGuard<'_, FileState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, FileState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the content with bytes; marks the payload dirty
    pub fn set_bytes(&self, bytes: impl Into<Vec<u8>>) {
        let mut state = self.write();
        state.pending = Some(PendingSource::Bytes(bytes.into()));
        state.dirty = true;
    }

    /// Replace the content with a local file; marks the payload dirty
    pub fn set_path(&self, path: impl AsRef<Path>) {
        let mut state = self.write();
        state.pending = Some(PendingSource::Path(path.as_ref().to_path_buf()));
        state.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.read().dirty
    }

    pub fn is_persisted(&self) -> bool {
        self.read().stored.is_some()
    }

    /// True when pending content comes from a local file
    pub fn has_unpersisted_file(&self) -> bool {
        matches!(self.read().pending, Some(PendingSource::Path(_)))
    }

    pub fn state(&self) -> PayloadState {
        let state = self.read();
        match (&state.stored, state.dirty) {
            (Some(_), false) => PayloadState::Persisted,
            (Some(_), true) => PayloadState::DirtyPersisted,
            (None, _) => PayloadState::Unpersisted,
        }
    }

    pub fn pending(&self) -> Option<PendingSource> {
        self.read().pending.clone()
    }

    pub fn stored(&self) -> Option<StoredFile> {
        self.read().stored.clone()
    }

    /// Filename of the pending local file, or of the stored file
    pub fn filename(&self) -> Option<String> {
        let state = self.read();
        if let Some(PendingSource::Path(path)) = &state.pending {
            return path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        state
            .stored
            .as_ref()
            .and_then(StoredFile::filename)
            .map(str::to_string)
    }

    /// Swap in a fresh handle after a successful store
    pub(crate) fn mark_stored(&self, file: StoredFile) {
        let mut state = self.write();
        state.stored = Some(file);
        state.pending = None;
        state.dirty = false;
    }

    /// Whether both handles point at the same payload
    pub fn ptr_eq(&self, other: &FilePayload) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }
}

impl PartialEq for FilePayload {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (self.read(), other.read());
        a.dirty == b.dirty && a.pending == b.pending && a.stored == b.stored
    }
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        let pending = match &state.pending {
            Some(PendingSource::Path(path)) => format!("path({})", path.display()),
            Some(PendingSource::Bytes(bytes)) => format!("bytes({})", bytes.len()),
            None => "none".to_string(),
        };
        f.debug_struct("FilePayload")
            .field("dirty", &state.dirty)
            .field("pending", &pending)
            .field("stored", &state.stored.as_ref().map(|file| &file.id))
            .finish()
    }
}

/// Rendered as a descriptor, never as content
impl Serialize for FilePayload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let state = self.read();
        let pending = match &state.pending {
            Some(PendingSource::Path(path)) => serde_json::json!({ "path": path.display().to_string() }),
            Some(PendingSource::Bytes(bytes)) => serde_json::json!({ "bytes": bytes.len() }),
            None => serde_json::Value::Null,
        };
        let descriptor = serde_json::json!({
            "file": {
                "dirty": state.dirty,
                "pending": pending,
                "id": state.stored.as_ref().map(|file| file.id.to_json()),
                "filename": state.stored.as_ref().and_then(StoredFile::filename),
            }
        });
        descriptor.serialize(serializer)
    }
}
