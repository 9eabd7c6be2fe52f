//! Wrapped operations

use super::{Gateway, GatewayError, GatewayResult, UpdateResult};
use crate::document::{Document, Value};
use crate::driver::FileStore;
use crate::events::{CollectionEvent, CollectionEventArgs, EventData};
use crate::file::{FilePayload, FileReconciler};
use crate::observability::LogRecord;
use crate::query::QueryRewriter;

impl Gateway {
    /// Dispatch `event` only when someone listens; `data` is built lazily.
    fn fire<'a>(&'a self, event: CollectionEvent, data: impl FnOnce() -> EventData<'a>) {
        if self.events.has_listeners(event) {
            self.events
                .dispatch(event, &CollectionEventArgs::new(self, data()));
        }
    }

    /// Payload field name as it appears in documents
    fn file_field(&self) -> GatewayResult<&str> {
        self.class
            .file_field_name()
            .ok_or_else(|| GatewayError::MissingFieldMapping {
                class: self.class.name.clone(),
                field: self.class.file.clone().unwrap_or_default(),
            })
    }

    fn file_store(&self) -> GatewayResult<&dyn FileStore> {
        self.collection
            .files()
            .ok_or_else(|| GatewayError::unsupported("storeFile", self.collection.name()))
    }

    fn reconciler(&self) -> GatewayResult<FileReconciler<'_>> {
        Ok(FileReconciler::new(
            self.file_store()?,
            self.collection.name(),
            &self.logger,
        ))
    }

    fn rewriter(&self) -> QueryRewriter<'_> {
        QueryRewriter::new(&self.class, &self.operator_prefix)
    }

    /// Insert several documents.
    ///
    /// File-backed types go through [`Gateway::insert_file`] one document at
    /// a time; everything else is one native batch insert. The first failure
    /// stops the batch.
    pub fn batch_insert(
        &self,
        mut documents: Vec<Document>,
        options: &Document,
    ) -> GatewayResult<Vec<Document>> {
        self.fire(CollectionEvent::PreBatchInsert, || {
            EventData::Documents(&documents)
        });

        if self.class.is_file() {
            for document in documents.iter_mut() {
                *document = self.insert_file(std::mem::take(document))?;
            }
        } else {
            self.collection.batch_insert(&mut documents, options)?;
        }

        self.logger.log_with(|| {
            LogRecord::new()
                .with("batchInsert", true)
                .with("num", documents.len())
                .with_documents("data", &documents)
        });

        self.fire(CollectionEvent::PostBatchInsert, || {
            EventData::Documents(&documents)
        });

        Ok(documents)
    }

    /// Store a document's payload if it changed, with the rest of the
    /// document as file metadata.
    ///
    /// A missing or clean payload stores nothing. The returned document still
    /// holds the payload, which now points at the stored file.
    pub fn insert_file(&self, document: Document) -> GatewayResult<Document> {
        self.fire(CollectionEvent::PreInsertFile, || {
            EventData::Document(&document)
        });

        let field = self.file_field()?;
        let payload = document.get(field).and_then(Value::as_file).cloned();

        if let Some(payload) = payload.as_ref().filter(|p| p.is_dirty()) {
            let metadata = document.without(field);
            self.reconciler()?.store(payload, &metadata)?;
        }

        self.fire(CollectionEvent::PostInsertFile, || {
            EventData::File(payload.as_ref())
        });

        Ok(document)
    }

    /// Update a file-backed document.
    ///
    /// The payload is taken out of the `set` section. If it changed, the
    /// current document is removed and stored again with the new content,
    /// keeping its non-file fields. Whatever else the update asks for is then
    /// applied with a regular update. Returns the update without the payload.
    pub fn update_file(
        &self,
        criteria: &Document,
        mut new_obj: Document,
        options: &Document,
    ) -> GatewayResult<Document> {
        self.fire(CollectionEvent::PreUpdateFile, || {
            EventData::Document(&new_obj)
        });

        let field = self.file_field()?;
        let set = self.operator("set");

        let mut extracted = None;
        if let Some(section) = new_obj.get_document_mut(&set) {
            extracted = section.remove(field);
            if section.is_empty() {
                new_obj.remove(&set);
            }
        }
        let payload: Option<FilePayload> = match extracted {
            Some(Value::File(payload)) => Some(payload),
            _ => None,
        };

        if let Some(payload) = payload.as_ref().filter(|p| p.is_dirty()) {
            // Resolve the file store before anything is removed
            let reconciler = self.reconciler()?;
            reconciler.recreate(payload, field, || self.find_and_remove(criteria, options))?;
        }

        if !new_obj.is_empty() {
            self.logger.log_with(|| {
                LogRecord::new()
                    .with("updating", true)
                    .with("file", true)
                    .with_document("criteria", criteria)
                    .with_document("set", &new_obj)
            });
            self.collection.update(criteria, &new_obj, options)?;
        }

        self.fire(CollectionEvent::PostUpdateFile, || {
            EventData::File(payload.as_ref())
        });

        Ok(new_obj)
    }

    /// Update documents matching `criteria`.
    ///
    /// File-backed types delegate to [`Gateway::update_file`].
    pub fn update(
        &self,
        criteria: &Document,
        new_obj: Document,
        options: &Document,
    ) -> GatewayResult<UpdateResult> {
        self.fire(CollectionEvent::PreUpdate, || EventData::Update {
            criteria,
            new_obj: &new_obj,
            options,
        });

        self.logger.log_with(|| {
            LogRecord::new()
                .with("update", true)
                .with_document("criteria", criteria)
                .with_document("newObj", &new_obj)
                .with_document("options", options)
        });

        let result = if self.class.is_file() {
            UpdateResult::File(self.update_file(criteria, new_obj, options)?)
        } else {
            UpdateResult::Native(self.collection.update(criteria, &new_obj, options)?)
        };

        self.fire(CollectionEvent::PostUpdate, || {
            EventData::UpdateResult(&result)
        });

        Ok(result)
    }

    /// Find documents, constrained to the type's hierarchy and with logical
    /// field names translated.
    pub fn find(&self, query: Document, fields: &Document) -> GatewayResult<Vec<Document>> {
        let query = self.rewriter().prepare_query(query);

        self.fire(CollectionEvent::PreFind, || EventData::Query {
            query: &query,
            fields,
        });

        self.logger.log_with(|| {
            LogRecord::new()
                .with("find", true)
                .with_document("query", &query)
                .with_document("fields", fields)
        });

        let results = self.collection.find(&query, fields)?;

        self.fire(CollectionEvent::PostFind, || EventData::Results(&results));

        Ok(results)
    }

    /// Find one document.
    ///
    /// On a file store the result is flattened: the stored file's document
    /// with the file handle attached under the payload field.
    pub fn find_one(&self, query: Document, fields: &Document) -> GatewayResult<Option<Document>> {
        let query = self.rewriter().prepare_query(query);

        self.fire(CollectionEvent::PreFindOne, || EventData::Query {
            query: &query,
            fields,
        });

        self.logger.log_with(|| {
            LogRecord::new()
                .with("findOne", true)
                .with_document("query", &query)
                .with_document("fields", fields)
        });

        let result = match self.collection.files().filter(|_| self.class.is_file()) {
            Some(files) => {
                let field = self.file_field()?;
                files.find_one_file(&query)?.map(|stored| {
                    let mut document = stored.metadata.clone();
                    document.insert(field, FilePayload::from_stored(stored));
                    document
                })
            }
            None => self.collection.find_one(&query, fields)?,
        };

        self.fire(CollectionEvent::PostFindOne, || {
            EventData::Found(result.as_ref())
        });

        Ok(result)
    }

    /// Atomically find and remove one document with the store's
    /// find-and-modify command.
    ///
    /// For file-backed types the removed file's chunks are deleted with a
    /// second, separate call. Nothing removed means no chunk cleanup.
    pub fn find_and_remove(
        &self,
        query: &Document,
        options: &Document,
    ) -> GatewayResult<Option<Document>> {
        let chunks = if self.class.is_file() {
            Some(self.file_store()?.chunks())
        } else {
            None
        };

        let command = Document::new()
            .with("findandmodify", self.collection.name())
            .with("query", query.clone())
            .with("remove", true);
        let result = self.db.command(&command)?;

        let document = match result.get("value") {
            Some(Value::Document(document)) => Some(document.clone()),
            _ => None,
        };

        if let (Some(chunks), Some(id)) = (chunks, document.as_ref().and_then(|d| d.get("_id"))) {
            chunks.remove(&Document::new().with("files_id", id.clone()), options)?;
        }

        Ok(document)
    }
}
