//! Structured log records and the enriching logger

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::document::{Document, Value};
use crate::mapping::MappedType;

/// A log sink accepting one structured record at a time.
pub trait Logger: Send + Sync {
    fn log(&self, record: &LogRecord);
}

impl<F> Logger for F
where
    F: Fn(&LogRecord) + Send + Sync,
{
    fn log(&self, record: &LogRecord) {
        self(record)
    }
}

/// One structured log record.
///
/// Keys are kept sorted so rendered output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn with_value(self, key: &str, value: &Value) -> Self {
        self.with(key, value.to_json())
    }

    pub fn with_document(self, key: &str, document: &Document) -> Self {
        self.with(key, document.to_json())
    }

    pub fn with_documents(self, key: &str, documents: &[Document]) -> Self {
        let rendered: Vec<_> = documents.iter().map(Document::to_json).collect();
        self.with(key, rendered)
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.fields.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &serde_json::Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Single-line JSON rendering
    pub fn to_json_line(&self) -> String {
        serde_json::to_string(&self.fields).unwrap_or_default()
    }
}

/// Logger bound to one mapped type.
///
/// Adds `class`, `db` and `collection` to every record before handing it to
/// the configured sink.
#[derive(Clone)]
pub struct ContextLogger {
    sink: Option<Arc<dyn Logger>>,
    class: String,
    db: String,
    collection: String,
}

impl ContextLogger {
    pub fn new(sink: Option<Arc<dyn Logger>>, class: &MappedType) -> Self {
        Self {
            sink,
            class: class.name.clone(),
            db: class.db.clone(),
            collection: class.collection.clone(),
        }
    }

    /// A logger that drops everything
    pub fn disabled(class: &MappedType) -> Self {
        Self::new(None, class)
    }

    pub fn enabled(&self) -> bool {
        self.sink.is_some()
    }

    pub fn log(&self, record: LogRecord) {
        let Some(sink) = &self.sink else {
            return;
        };
        let record = record
            .with("class", self.class.as_str())
            .with("db", self.db.as_str())
            .with("collection", self.collection.as_str());
        sink.log(&record);
    }

    /// Build and log a record only when a sink is configured
    pub fn log_with(&self, build: impl FnOnce() -> LogRecord) {
        if self.enabled() {
            self.log(build());
        }
    }
}

impl fmt::Debug for ContextLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextLogger")
            .field("enabled", &self.enabled())
            .field("class", &self.class)
            .field("db", &self.db)
            .field("collection", &self.collection)
            .finish()
    }
}
