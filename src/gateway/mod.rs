//! # Persistence Gateway
//!
//! One [`Gateway`] wraps the native collection of one mapped type and adds,
//! around the raw operations:
//!
//! - pre/post events for every bracketed operation
//! - logical to on-disk field aliasing of queries
//! - discriminator constraints for polymorphic hierarchies
//! - file payload reconciliation for file-backed types
//!
//! Everything else is forwarded to the driver through [`Gateway::call`] or
//! [`Gateway::native`].
//!
//! ## Non-atomic sequences
//!
//! Updating a file-backed document with a changed payload removes the
//! document, then stores the new content. A failure between the two leaves
//! the document removed. Removing a file document and removing its chunks
//! are likewise two calls. Neither sequence is compensated.

mod errors;
mod operations;
mod passthrough;

use std::fmt;
use std::sync::Arc;

pub use errors::{GatewayError, GatewayResult};

use crate::config::Configuration;
use crate::document::Document;
use crate::driver::{DriverCollection, DriverDatabase};
use crate::events::EventHub;
use crate::mapping::MappedType;
use crate::observability::{ContextLogger, LogRecord};

/// What [`Gateway::update`] produced. The two branches have different
/// shapes and callers must not treat them alike.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateResult {
    /// File-backed types: the update document with the payload removed
    File(Document),
    /// Other types: the store's status document
    Native(Document),
}

impl UpdateResult {
    pub fn document(&self) -> &Document {
        match self {
            Self::File(doc) | Self::Native(doc) => doc,
        }
    }

    pub fn into_document(self) -> Document {
        match self {
            Self::File(doc) | Self::Native(doc) => doc,
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self, Self::File(_))
    }
}

/// The persistence gateway for one mapped type
pub struct Gateway {
    collection: Arc<dyn DriverCollection>,
    db: Arc<dyn DriverDatabase>,
    class: Arc<MappedType>,
    events: Arc<dyn EventHub>,
    logger: ContextLogger,
    operator_prefix: String,
}

impl Gateway {
    pub fn new(
        collection: Arc<dyn DriverCollection>,
        db: Arc<dyn DriverDatabase>,
        class: Arc<MappedType>,
        events: Arc<dyn EventHub>,
        config: &Configuration,
    ) -> Self {
        let logger = ContextLogger::new(config.logger.clone(), &class);
        Self {
            collection,
            db,
            class,
            events,
            logger,
            operator_prefix: config.operator_prefix.clone(),
        }
    }

    /// Log through the configured sink, tagged with the type's name,
    /// database and collection. Does nothing without a sink.
    pub fn log(&self, record: LogRecord) {
        self.logger.log(record);
    }

    pub fn class(&self) -> &MappedType {
        &self.class
    }

    /// The wrapped native collection
    pub fn collection(&self) -> &dyn DriverCollection {
        self.collection.as_ref()
    }

    pub fn database(&self) -> &dyn DriverDatabase {
        self.db.as_ref()
    }

    pub fn operator_prefix(&self) -> &str {
        &self.operator_prefix
    }

    fn operator(&self, name: &str) -> String {
        format!("{}{}", self.operator_prefix, name)
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("class", &self.class.name)
            .field("collection", &self.collection.name())
            .field("db", &self.db.name())
            .field("operator_prefix", &self.operator_prefix)
            .finish()
    }
}
