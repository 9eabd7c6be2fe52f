//! In-memory collection

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use super::matcher::{apply_update, is_operator_update, matches, project, truthy, upsert_seed};
use crate::document::{Document, Value};
use crate::driver::{ChunkCollection, DriverCollection, DriverError, DriverResult, NativeOp};

/// An ordered set of documents guarded by a single lock.
///
/// Every mutating call takes the write lock once, so a multi-document
/// update is observed either fully applied or not at all.
#[derive(Debug)]
pub struct MemoryCollection {
    name: String,
    operator_prefix: String,
    documents: RwLock<Vec<Document>>,
}

/// Put a generated `_id` first when the document has none. Returns the id.
fn ensure_id(document: &mut Document) -> Value {
    if let Some(id) = document.get("_id") {
        return id.clone();
    }
    let id = Value::String(Uuid::new_v4().to_string());
    let mut with_id = Document::new().with("_id", id.clone());
    with_id.extend(std::mem::take(document));
    *document = with_id;
    id
}

impl MemoryCollection {
    pub fn new(name: impl Into<String>, operator_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator_prefix: operator_prefix.into(),
            documents: RwLock::new(Vec::new()),
        }
    }

    fn read(&self) -> DriverResult<RwLockReadGuard<'_, Vec<Document>>> {
        self.documents.read().map_err(|_| DriverError::LockPoisoned)
    }

    fn write(&self) -> DriverResult<RwLockWriteGuard<'_, Vec<Document>>> {
        self.documents.write().map_err(|_| DriverError::LockPoisoned)
    }

    pub fn len(&self) -> usize {
        self.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of every stored document in insertion order
    pub fn documents(&self) -> Vec<Document> {
        self.read().map(|docs| docs.clone()).unwrap_or_default()
    }

    /// Insert one document, assigning `_id` when missing.
    pub fn insert_one(&self, document: &mut Document) -> DriverResult<Value> {
        let id = ensure_id(document);
        let mut docs = self.write()?;
        if docs.iter().any(|d| d.get("_id") == Some(&id)) {
            return Err(DriverError::command(
                "insert",
                format!("duplicate key {} in {}", id.to_json(), self.name),
            ));
        }
        docs.push(document.clone());
        Ok(id)
    }

    /// Insert, or replace the document with the same `_id`.
    pub fn save(&self, document: &mut Document) -> DriverResult<Value> {
        let id = ensure_id(document);
        let mut docs = self.write()?;
        match docs.iter_mut().find(|d| d.get("_id") == Some(&id)) {
            Some(existing) => *existing = document.clone(),
            None => docs.push(document.clone()),
        }
        Ok(id)
    }

    pub fn find_matching(&self, query: &Document, limit: Option<usize>) -> DriverResult<Vec<Document>> {
        let docs = self.read()?;
        Ok(docs
            .iter()
            .filter(|d| matches(d, query, &self.operator_prefix))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    pub fn count(&self, query: &Document) -> DriverResult<u64> {
        let docs = self.read()?;
        Ok(docs
            .iter()
            .filter(|d| matches(d, query, &self.operator_prefix))
            .count() as u64)
    }

    /// Remove matching documents and return them.
    pub fn remove_matching(&self, query: &Document, just_one: bool) -> DriverResult<Vec<Document>> {
        let mut docs = self.write()?;
        let mut removed = Vec::new();
        let mut index = 0;
        while index < docs.len() {
            if (!just_one || removed.is_empty()) && matches(&docs[index], query, &self.operator_prefix) {
                removed.push(docs.remove(index));
            } else {
                index += 1;
            }
        }
        Ok(removed)
    }

    /// Atomically remove the first match.
    pub fn find_and_remove(&self, query: &Document) -> DriverResult<Option<Document>> {
        Ok(self.remove_matching(query, true)?.into_iter().next())
    }

    /// Atomically update the first match, returning the document before or
    /// after the change.
    pub fn find_and_update(
        &self,
        query: &Document,
        update: &Document,
        return_new: bool,
    ) -> DriverResult<Option<Document>> {
        let mut docs = self.write()?;
        let Some(existing) = docs
            .iter_mut()
            .find(|d| matches(d, query, &self.operator_prefix))
        else {
            return Ok(None);
        };

        let mut updated = existing.clone();
        apply_update(&mut updated, update, &self.operator_prefix)?;
        let before = std::mem::replace(existing, updated.clone());
        Ok(Some(if return_new { updated } else { before }))
    }

    /// Update matching documents. Returns `{ok, n, updatedExisting}` plus
    /// `upserted` when a document was created.
    pub fn update_matching(
        &self,
        criteria: &Document,
        update: &Document,
        multi: bool,
        upsert: bool,
    ) -> DriverResult<Document> {
        let mut docs = self.write()?;

        let mut changed = Vec::new();
        for (index, doc) in docs.iter().enumerate() {
            if !matches(doc, criteria, &self.operator_prefix) {
                continue;
            }
            let mut updated = doc.clone();
            apply_update(&mut updated, update, &self.operator_prefix)?;
            changed.push((index, updated));
            if !multi {
                break;
            }
        }

        let n = changed.len();
        for (index, updated) in changed {
            docs[index] = updated;
        }

        let status = Document::new().with("ok", 1);
        if n > 0 || !upsert {
            return Ok(status.with("n", n).with("updatedExisting", n > 0));
        }

        let mut created = upsert_seed(criteria, &self.operator_prefix);
        if is_operator_update(update, &self.operator_prefix) {
            apply_update(&mut created, update, &self.operator_prefix)?;
        } else {
            let seeded_id = created.remove("_id");
            created = update.clone();
            if let (Some(id), false) = (seeded_id, created.contains_key("_id")) {
                created.insert("_id", id);
            }
        }
        let id = ensure_id(&mut created);
        docs.push(created);

        Ok(status
            .with("n", 1)
            .with("updatedExisting", false)
            .with("upserted", id))
    }

    pub fn clear(&self) -> DriverResult<()> {
        self.write()?.clear();
        Ok(())
    }
}

impl DriverCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    fn batch_insert(&self, documents: &mut [Document], _options: &Document) -> DriverResult<()> {
        for document in documents.iter_mut() {
            self.insert_one(document)?;
        }
        Ok(())
    }

    fn update(&self, criteria: &Document, new_obj: &Document, options: &Document) -> DriverResult<Document> {
        self.update_matching(
            criteria,
            new_obj,
            truthy(options.get("multi")),
            truthy(options.get("upsert")),
        )
    }

    fn find(&self, query: &Document, fields: &Document) -> DriverResult<Vec<Document>> {
        Ok(self
            .find_matching(query, None)?
            .iter()
            .map(|d| project(d, fields))
            .collect())
    }

    fn find_one(&self, query: &Document, fields: &Document) -> DriverResult<Option<Document>> {
        Ok(self
            .find_matching(query, Some(1))?
            .first()
            .map(|d| project(d, fields)))
    }

    fn native(&self, op: NativeOp) -> DriverResult<Value> {
        match op {
            NativeOp::Insert { mut document, .. } => self.insert_one(&mut document),
            NativeOp::Save { mut document, .. } => self.save(&mut document),
            NativeOp::Remove { criteria, options } => {
                let removed = self.remove_matching(&criteria, truthy(options.get("justOne")))?;
                Ok(Value::from(removed.len()))
            }
            NativeOp::Count { query } => Ok(Value::from(self.count(&query)?)),
            NativeOp::Drop => {
                self.clear()?;
                Ok(Value::Bool(true))
            }
            NativeOp::GetName => Ok(Value::String(self.name.clone())),
        }
    }
}

impl ChunkCollection for MemoryCollection {
    fn remove(&self, filter: &Document, options: &Document) -> DriverResult<u64> {
        let removed = self.remove_matching(filter, truthy(options.get("justOne")))?;
        Ok(removed.len() as u64)
    }
}
