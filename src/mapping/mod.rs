//! # Type Mapping
//!
//! Read-only metadata describing one mapped document type: where it lives,
//! how logical field names map to on-disk names, whether it is backed by the
//! file store, and how it participates in a discriminated hierarchy.
//!
//! Mapping definitions are normally produced by the object-mapping layer.
//! They can also be loaded from JSON files via [`MappingLoader`].

mod errors;
mod loader;
mod types;

pub use errors::{MappingError, MappingResult};
pub use loader::MappingLoader;
pub use types::{FieldMapping, MappedType};
