//! Recording fakes for the driver and event traits.
//!
//! Every fake appends to one shared [`Journal`] so tests can assert the
//! exact order of store calls and event dispatches.

#![allow(dead_code)]

use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use docgate::driver::{
    ChunkCollection, DriverCollection, DriverDatabase, DriverError, DriverResult, FileStore,
};
use docgate::{
    CollectionEvent, CollectionEventArgs, Configuration, Document, EventHub, Gateway, MappedType,
    StoredFile, Value,
};

/// One recorded call
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub documents: Vec<Document>,
}

#[derive(Debug, Clone, Default)]
pub struct Journal {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, name: &str, documents: Vec<Document>) {
        self.calls.lock().unwrap().push(Call {
            name: name.to_string(),
            documents,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.name).collect()
    }

    /// Names without the `event:` entries
    pub fn store_calls(&self) -> Vec<String> {
        self.names()
            .into_iter()
            .filter(|n| !n.starts_with("event:"))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<Call> {
        self.calls().into_iter().find(|c| c.name == name)
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.name == name).count()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }
}

/// A plain collection that records calls and returns canned results
pub struct RecordingCollection {
    pub name: String,
    pub journal: Journal,
    pub find_results: Mutex<Vec<Document>>,
}

impl RecordingCollection {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            find_results: Mutex::new(Vec::new()),
        }
    }
}

impl DriverCollection for RecordingCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn batch_insert(&self, documents: &mut [Document], options: &Document) -> DriverResult<()> {
        let mut recorded = documents.to_vec();
        recorded.push(options.clone());
        self.journal.record("batchInsert", recorded);
        Ok(())
    }

    fn update(&self, criteria: &Document, new_obj: &Document, options: &Document) -> DriverResult<Document> {
        self.journal
            .record("update", vec![criteria.clone(), new_obj.clone(), options.clone()]);
        Ok(Document::new().with("ok", 1).with("n", 1))
    }

    fn find(&self, query: &Document, fields: &Document) -> DriverResult<Vec<Document>> {
        self.journal.record("find", vec![query.clone(), fields.clone()]);
        Ok(self.find_results.lock().unwrap().clone())
    }

    fn find_one(&self, query: &Document, fields: &Document) -> DriverResult<Option<Document>> {
        self.journal.record("findOne", vec![query.clone(), fields.clone()]);
        Ok(self.find_results.lock().unwrap().first().cloned())
    }
}

pub struct RecordingChunks {
    journal: Journal,
}

impl ChunkCollection for RecordingChunks {
    fn remove(&self, filter: &Document, options: &Document) -> DriverResult<u64> {
        self.journal
            .record("chunks.remove", vec![filter.clone(), options.clone()]);
        Ok(1)
    }
}

/// A file store collection. `fail_store` makes every store call fail.
pub struct RecordingGridFs {
    pub inner: RecordingCollection,
    pub chunks: RecordingChunks,
    pub fail_store: AtomicBool,
    pub stored_file: Mutex<Option<StoredFile>>,
}

impl RecordingGridFs {
    pub fn new(journal: &Journal) -> Self {
        Self {
            inner: RecordingCollection::new("fs.files", journal),
            chunks: RecordingChunks {
                journal: journal.clone(),
            },
            fail_store: AtomicBool::new(false),
            stored_file: Mutex::new(None),
        }
    }

    pub fn fail_stores(&self) {
        self.fail_store.store(true, Ordering::SeqCst);
    }

    fn stored(&self, name: &str, metadata: &Document) -> DriverResult<Value> {
        self.inner.journal.record(name, vec![metadata.clone()]);
        if self.fail_store.load(Ordering::SeqCst) {
            return Err(DriverError::Io("chunk write failed".to_string()));
        }
        Ok(metadata.get("_id").cloned().unwrap_or_else(|| Value::from("new-id")))
    }
}

impl DriverCollection for RecordingGridFs {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn batch_insert(&self, documents: &mut [Document], options: &Document) -> DriverResult<()> {
        self.inner.batch_insert(documents, options)
    }

    fn update(&self, criteria: &Document, new_obj: &Document, options: &Document) -> DriverResult<Document> {
        self.inner.update(criteria, new_obj, options)
    }

    fn find(&self, query: &Document, fields: &Document) -> DriverResult<Vec<Document>> {
        self.inner.find(query, fields)
    }

    fn find_one(&self, query: &Document, fields: &Document) -> DriverResult<Option<Document>> {
        self.inner.find_one(query, fields)
    }

    fn files(&self) -> Option<&dyn FileStore> {
        Some(self)
    }
}

impl FileStore for RecordingGridFs {
    fn store_file(&self, _path: &Path, metadata: &Document) -> DriverResult<Value> {
        self.stored("storeFile", metadata)
    }

    fn store_bytes(&self, _bytes: &[u8], metadata: &Document) -> DriverResult<Value> {
        self.stored("storeBytes", metadata)
    }

    fn find_one_file(&self, query: &Document) -> DriverResult<Option<StoredFile>> {
        self.inner.journal.record("findOneFile", vec![query.clone()]);
        Ok(self.stored_file.lock().unwrap().clone())
    }

    fn read_bytes(&self, _file: &StoredFile) -> DriverResult<Vec<u8>> {
        Ok(Vec::new())
    }

    fn chunks(&self) -> &dyn ChunkCollection {
        &self.chunks
    }
}

/// Answers `findandmodify` with `removed`, or null when unset
pub struct RecordingDatabase {
    pub journal: Journal,
    pub removed: Mutex<Option<Document>>,
}

impl RecordingDatabase {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            removed: Mutex::new(None),
        }
    }

    pub fn will_remove(&self, document: Document) {
        *self.removed.lock().unwrap() = Some(document);
    }
}

impl DriverDatabase for RecordingDatabase {
    fn name(&self) -> &str {
        "app"
    }

    fn command(&self, command: &Document) -> DriverResult<Document> {
        let name = command.keys().next().unwrap_or_default().to_string();
        self.journal.record(&name, vec![command.clone()]);
        let value = self
            .removed
            .lock()
            .unwrap()
            .take()
            .map(Value::Document)
            .unwrap_or_default();
        Ok(Document::new().with("value", value).with("ok", 1))
    }
}

/// Records `event:<name>` for the events it listens to
pub struct RecordingHub {
    journal: Journal,
    listening: HashSet<CollectionEvent>,
}

impl RecordingHub {
    pub fn new(journal: &Journal, listening: &[CollectionEvent]) -> Self {
        Self {
            journal: journal.clone(),
            listening: listening.iter().copied().collect(),
        }
    }

    pub fn all(journal: &Journal) -> Self {
        Self::new(journal, &CollectionEvent::ALL)
    }
}

impl EventHub for RecordingHub {
    fn has_listeners(&self, event: CollectionEvent) -> bool {
        self.listening.contains(&event)
    }

    fn dispatch(&self, event: CollectionEvent, _args: &CollectionEventArgs<'_>) {
        self.journal.record(&format!("event:{}", event), Vec::new());
    }
}

/// Gateway over a recording file store for a type with payload field `file`
pub fn file_gateway(
    journal: &Journal,
    hub: RecordingHub,
) -> (Gateway, Arc<RecordingGridFs>, Arc<RecordingDatabase>) {
    let grid = Arc::new(RecordingGridFs::new(journal));
    let db = Arc::new(RecordingDatabase::new(journal));
    let class = MappedType::new("Image", "app", "fs.files").with_file("file");
    let gateway = Gateway::new(
        grid.clone(),
        db.clone(),
        Arc::new(class),
        Arc::new(hub),
        &Configuration::default(),
    );
    (gateway, grid, db)
}

/// Gateway over a recording plain collection
pub fn plain_gateway(
    journal: &Journal,
    class: MappedType,
    hub: RecordingHub,
) -> (Gateway, Arc<RecordingCollection>) {
    let collection = Arc::new(RecordingCollection::new(&class.collection, journal));
    let gateway = Gateway::new(
        collection.clone(),
        Arc::new(RecordingDatabase::new(journal)),
        Arc::new(class),
        Arc::new(hub),
        &Configuration::default(),
    );
    (gateway, collection)
}
