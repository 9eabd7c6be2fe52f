//! docgate - a persistence gateway for mapped document collections
//!
//! A [`Gateway`] sits between application code and a document store's native
//! driver for one mapped type. Around the raw collection operations it adds
//! pre/post events, field aliasing, discriminator query rewriting and
//! reconciliation of file payloads kept in a chunked sidecar store.
//!
//! The store is reached only through the traits in [`driver`];
//! [`driver::memory`] implements them in process.

pub mod config;
pub mod document;
pub mod driver;
pub mod events;
pub mod file;
pub mod gateway;
pub mod mapping;
pub mod observability;
pub mod query;

pub use config::{Configuration, GatewaySettings};
pub use document::{Document, Value};
pub use events::{CollectionEvent, CollectionEventArgs, EventData, EventHub, EventManager};
pub use file::{FilePayload, StoredFile};
pub use gateway::{Gateway, GatewayError, GatewayResult, UpdateResult};
pub use mapping::MappedType;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
