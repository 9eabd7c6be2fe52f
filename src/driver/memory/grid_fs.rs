//! In-memory chunked file store

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::collection::MemoryCollection;
use super::matcher::truthy;
use crate::document::{Document, Value};
use crate::driver::{ChunkCollection, DriverCollection, DriverError, DriverResult, FileStore, NativeOp};
use crate::file::StoredFile;

/// Default chunk size in bytes
pub const DEFAULT_CHUNK_SIZE: usize = 255 * 1024;

/// A file store over a `<prefix>.files` / `<prefix>.chunks` collection pair.
///
/// File documents carry the caller's metadata fields at the top level next
/// to `filename`, `length`, `chunkSize`, `uploadDate` and `checksum`.
/// Chunks are `{_id, files_id, n, data}`.
#[derive(Debug, Clone)]
pub struct MemoryGridFs {
    files: Arc<MemoryCollection>,
    chunks: Arc<MemoryCollection>,
    chunk_size: usize,
}

impl MemoryGridFs {
    pub(crate) fn new(files: Arc<MemoryCollection>, chunks: Arc<MemoryCollection>) -> Self {
        Self {
            files,
            chunks,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn files_collection(&self) -> &Arc<MemoryCollection> {
        &self.files
    }

    pub fn chunks_collection(&self) -> &Arc<MemoryCollection> {
        &self.chunks
    }

    /// Write chunks first, then the file document.
    ///
    /// A failed store removes only the chunks it wrote itself, so the chunks
    /// of an existing file with the same id stay intact.
    fn store(&self, bytes: &[u8], filename: Option<String>, metadata: &Document) -> DriverResult<Value> {
        let id = metadata
            .get("_id")
            .cloned()
            .unwrap_or_else(|| Value::String(Uuid::new_v4().to_string()));

        if self.files.count(&Document::new().with("_id", id.clone()))? > 0 {
            return Err(DriverError::command(
                "insert",
                format!("duplicate key {} in {}", id.to_json(), self.files.name()),
            ));
        }

        let mut written = Vec::new();
        for (n, chunk) in bytes.chunks(self.chunk_size).enumerate() {
            let mut record = Document::new()
                .with("files_id", id.clone())
                .with("n", n)
                .with("data", chunk.to_vec());
            match self.chunks.insert_one(&mut record) {
                Ok(chunk_id) => written.push(chunk_id),
                Err(err) => {
                    self.discard_chunks(written)?;
                    return Err(err);
                }
            }
        }

        let mut file = Document::new().with("_id", id.clone());
        file.extend(
            metadata
                .iter()
                .filter(|(k, _)| *k != "_id")
                .map(|(k, v)| (k.to_string(), v.clone())),
        );
        if let Some(filename) = filename {
            file.insert("filename", filename);
        }
        file.insert("length", bytes.len());
        file.insert("chunkSize", self.chunk_size);
        file.insert("uploadDate", Utc::now().to_rfc3339());
        file.insert("checksum", StoredFile::calculate_checksum(bytes));

        if let Err(err) = self.files.insert_one(&mut file) {
            self.discard_chunks(written)?;
            return Err(err);
        }

        Ok(id)
    }

    fn discard_chunks(&self, chunk_ids: Vec<Value>) -> DriverResult<()> {
        for chunk_id in chunk_ids {
            self.chunks
                .remove_matching(&Document::new().with("_id", chunk_id), true)?;
        }
        Ok(())
    }

    fn remove_files(&self, criteria: &Document, just_one: bool) -> DriverResult<usize> {
        let removed = self.files.remove_matching(criteria, just_one)?;
        for file in &removed {
            if let Some(id) = file.get("_id") {
                self.chunks
                    .remove_matching(&Document::new().with("files_id", id.clone()), false)?;
            }
        }
        Ok(removed.len())
    }
}

impl FileStore for MemoryGridFs {
    fn store_file(&self, path: &Path, metadata: &Document) -> DriverResult<Value> {
        let bytes = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned());
        self.store(&bytes, filename, metadata)
    }

    fn store_bytes(&self, bytes: &[u8], metadata: &Document) -> DriverResult<Value> {
        self.store(bytes, None, metadata)
    }

    fn find_one_file(&self, query: &Document) -> DriverResult<Option<StoredFile>> {
        Ok(self
            .files
            .find_matching(query, Some(1))?
            .into_iter()
            .next()
            .map(|doc| {
                let id = doc.get("_id").cloned().unwrap_or_default();
                StoredFile::new(id, self.files.name(), doc)
            }))
    }

    fn read_bytes(&self, file: &StoredFile) -> DriverResult<Vec<u8>> {
        let mut chunks = self
            .chunks
            .find_matching(&Document::new().with("files_id", file.id.clone()), None)?;
        chunks.sort_by_key(|chunk| chunk.get("n").and_then(Value::as_i64).unwrap_or(0));

        let mut bytes = Vec::new();
        for chunk in &chunks {
            if let Some(Value::Binary(data)) = chunk.get("data") {
                bytes.extend_from_slice(data);
            }
        }
        Ok(bytes)
    }

    fn chunks(&self) -> &dyn ChunkCollection {
        self.chunks.as_ref()
    }
}

impl DriverCollection for MemoryGridFs {
    fn name(&self) -> &str {
        self.files.name()
    }

    fn batch_insert(&self, documents: &mut [Document], options: &Document) -> DriverResult<()> {
        self.files.batch_insert(documents, options)
    }

    fn update(&self, criteria: &Document, new_obj: &Document, options: &Document) -> DriverResult<Document> {
        self.files.update(criteria, new_obj, options)
    }

    fn find(&self, query: &Document, fields: &Document) -> DriverResult<Vec<Document>> {
        self.files.find(query, fields)
    }

    fn find_one(&self, query: &Document, fields: &Document) -> DriverResult<Option<Document>> {
        self.files.find_one(query, fields)
    }

    fn files(&self) -> Option<&dyn FileStore> {
        Some(self)
    }

    fn native(&self, op: NativeOp) -> DriverResult<Value> {
        match op {
            NativeOp::Remove { criteria, options } => {
                let removed = self.remove_files(&criteria, truthy(options.get("justOne")))?;
                Ok(Value::from(removed))
            }
            NativeOp::Drop => {
                self.files.clear()?;
                self.chunks.clear()?;
                Ok(Value::Bool(true))
            }
            op => self.files.native(op),
        }
    }
}
