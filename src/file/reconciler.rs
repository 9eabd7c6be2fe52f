//! File reconciliation
//!
//! Two sequences live here:
//!
//! 1. Store: write pending payload content to the chunked store with the
//!    owning document as metadata, then refresh the payload's handle.
//! 2. Recreate: remove the current file document (and its chunks), strip
//!    the sidecar fields from it and store the new content with what is
//!    left.
//!
//! Recreate is not atomic. Between the removal and the store the document
//! is absent from the collection, and if the store fails the document stays
//! removed. Nothing here compensates for that; the failure is returned to
//! the caller as is.

use std::path::Path;

use super::payload::{FilePayload, PendingSource, StoredFile};
use crate::document::{Document, Value};
use crate::driver::FileStore;
use crate::gateway::GatewayResult;
use crate::observability::{ContextLogger, LogRecord};

/// Fields the chunked store maintains on every file document
pub const SIDECAR_FIELDS: [&str; 5] = ["filename", "length", "chunkSize", "uploadDate", "checksum"];

/// Stores and recreates file payloads against one file store.
pub struct FileReconciler<'a> {
    files: &'a dyn FileStore,
    collection: &'a str,
    logger: &'a ContextLogger,
}

impl<'a> FileReconciler<'a> {
    pub fn new(files: &'a dyn FileStore, collection: &'a str, logger: &'a ContextLogger) -> Self {
        Self {
            files,
            collection,
            logger,
        }
    }

    /// Write the payload's pending content with `metadata` attached.
    ///
    /// Path mode uploads the local file, bytes mode uploads from memory.
    /// A payload with nothing pending is returned untouched.
    pub fn store(&self, payload: &FilePayload, metadata: &Document) -> GatewayResult<FilePayload> {
        let id = match payload.pending() {
            Some(PendingSource::Path(path)) => self.store_path(payload, &path, metadata)?,
            Some(PendingSource::Bytes(bytes)) => {
                self.logger.log_with(|| {
                    LogRecord::new()
                        .with("storing", true)
                        .with("bytes", true)
                        .with_document("document", metadata)
                });
                self.files.store_bytes(&bytes, metadata)?
            }
            None => return Ok(payload.clone()),
        };

        let mut stored = metadata.clone();
        if !stored.contains_key("_id") {
            stored.insert("_id", id.clone());
        }
        payload.mark_stored(StoredFile::new(id, self.collection, stored));

        Ok(payload.clone())
    }

    fn store_path(
        &self,
        payload: &FilePayload,
        path: &Path,
        metadata: &Document,
    ) -> GatewayResult<Value> {
        self.logger.log_with(|| {
            LogRecord::new()
                .with("storing", true)
                .with("file", serde_json::to_value(payload).unwrap_or_default())
                .with_document("document", metadata)
        });
        Ok(self.files.store_file(path, metadata)?)
    }

    /// Remove the current file document via `find_and_remove`, then store
    /// the payload with the document's remaining fields.
    ///
    /// When nothing was removed the payload is stored with empty metadata.
    pub fn recreate<F>(
        &self,
        payload: &FilePayload,
        payload_field: &str,
        find_and_remove: F,
    ) -> GatewayResult<FilePayload>
    where
        F: FnOnce() -> GatewayResult<Option<Document>>,
    {
        let removed = find_and_remove()?.unwrap_or_default();
        let metadata = Self::strip_sidecar_fields(removed, payload_field);
        self.store(payload, &metadata)
    }

    /// Drop the store-maintained fields and the payload field itself.
    pub fn strip_sidecar_fields(mut document: Document, payload_field: &str) -> Document {
        for field in SIDECAR_FIELDS {
            document.remove(field);
        }
        document.remove(payload_field);
        document
    }
}
