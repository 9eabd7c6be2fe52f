//! # Native Driver Surface
//!
//! The gateway talks to the data store exclusively through these traits.
//! Implementations wrap a real client; [`memory`] provides an in-process one.

pub mod memory;

mod errors;
mod native;

use std::path::Path;

pub use errors::{DriverError, DriverResult};
pub use native::NativeOp;

use crate::document::{Document, Value};
use crate::file::StoredFile;

/// A native collection handle
pub trait DriverCollection: Send + Sync {
    /// Collection name as the store knows it
    fn name(&self) -> &str;

    /// Insert all documents in one round trip. Drivers may assign `_id`.
    fn batch_insert(&self, documents: &mut [Document], options: &Document) -> DriverResult<()>;

    /// Apply `new_obj` to documents matching `criteria`; returns the store's
    /// status document
    fn update(&self, criteria: &Document, new_obj: &Document, options: &Document)
        -> DriverResult<Document>;

    fn find(&self, query: &Document, fields: &Document) -> DriverResult<Vec<Document>>;

    fn find_one(&self, query: &Document, fields: &Document) -> DriverResult<Option<Document>>;

    /// File store capabilities, when this collection is backed by one
    fn files(&self) -> Option<&dyn FileStore> {
        None
    }

    /// Operations the gateway forwards without wrapping
    fn native(&self, op: NativeOp) -> DriverResult<Value> {
        Err(DriverError::Unsupported(op.method().to_string()))
    }
}

/// A native database handle
pub trait DriverDatabase: Send + Sync {
    fn name(&self) -> &str;

    /// Run a database command and return its result document
    fn command(&self, command: &Document) -> DriverResult<Document>;
}

/// Chunked file storage attached to a collection
pub trait FileStore: Send + Sync {
    /// Upload a local file; returns the new file id
    fn store_file(&self, path: &Path, metadata: &Document) -> DriverResult<Value>;

    /// Upload bytes; returns the new file id
    fn store_bytes(&self, bytes: &[u8], metadata: &Document) -> DriverResult<Value>;

    fn find_one_file(&self, query: &Document) -> DriverResult<Option<StoredFile>>;

    /// Reassemble a stored file's content
    fn read_bytes(&self, file: &StoredFile) -> DriverResult<Vec<u8>>;

    /// The sidecar chunk collection
    fn chunks(&self) -> &dyn ChunkCollection;
}

/// The collection holding file chunks
pub trait ChunkCollection: Send + Sync {
    /// Remove matching chunk records; returns how many were removed
    fn remove(&self, filter: &Document, options: &Document) -> DriverResult<u64>;
}
