//! In-memory database

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use super::collection::MemoryCollection;
use super::grid_fs::MemoryGridFs;
use super::matcher::truthy;
use crate::document::{Document, Value};
use crate::driver::{DriverDatabase, DriverError, DriverResult};

/// A named set of in-memory collections created on first use.
#[derive(Debug)]
pub struct MemoryDatabase {
    name: String,
    operator_prefix: String,
    collections: RwLock<HashMap<String, Arc<MemoryCollection>>>,
}

impl MemoryDatabase {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator_prefix: "$".to_string(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Use a different operator keyword prefix. Affects collections created
    /// afterwards.
    pub fn with_operator_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.operator_prefix = prefix.into();
        self
    }

    /// Get or create a collection
    pub fn collection(&self, name: &str) -> Arc<MemoryCollection> {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        collections
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryCollection::new(name, self.operator_prefix.clone())))
            .clone()
    }

    /// A file store over `<prefix>.files` and `<prefix>.chunks`
    pub fn grid_fs(&self, prefix: &str) -> MemoryGridFs {
        MemoryGridFs::new(
            self.collection(&format!("{}.files", prefix)),
            self.collection(&format!("{}.chunks", prefix)),
        )
    }

    pub fn collection_names(&self) -> Vec<String> {
        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<_> = collections.keys().cloned().collect();
        names.sort();
        names
    }

    fn existing(&self, name: &str) -> Option<Arc<MemoryCollection>> {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    fn find_and_modify(&self, target: &str, command: &Document) -> DriverResult<Document> {
        let empty = Document::new();
        let query = command.get_document("query").unwrap_or(&empty);

        let value = match self.existing(target) {
            None => None,
            Some(collection) if truthy(command.get("remove")) => collection.find_and_remove(query)?,
            Some(collection) => {
                let update = command.get_document("update").ok_or_else(|| {
                    DriverError::command("findandmodify", "either remove or update is required")
                })?;
                collection.find_and_update(query, update, truthy(command.get("new")))?
            }
        };

        Ok(Document::new()
            .with("value", value.map(Value::Document).unwrap_or_default())
            .with("ok", 1))
    }
}

impl DriverDatabase for MemoryDatabase {
    fn name(&self) -> &str {
        &self.name
    }

    /// Supports `findandmodify` and `count`. The first key names the command
    /// and holds the target collection.
    fn command(&self, command: &Document) -> DriverResult<Document> {
        let (name, target) = command
            .iter()
            .next()
            .ok_or_else(|| DriverError::command("", "empty command document"))?;
        let target = target.as_str().ok_or_else(|| {
            DriverError::command(name, "command value must be a collection name")
        })?;

        match name {
            "findandmodify" | "findAndModify" => self.find_and_modify(target, command),
            "count" => {
                let empty = Document::new();
                let query = command.get_document("query").unwrap_or(&empty);
                let n = match self.existing(target) {
                    Some(collection) => collection.count(query)?,
                    None => 0,
                };
                Ok(Document::new().with("n", n).with("ok", 1))
            }
            other => Err(DriverError::command(other, "no such command")),
        }
    }
}
