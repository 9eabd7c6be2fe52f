//! # In-Memory Driver
//!
//! An in-process implementation of the native driver traits. Useful for
//! tests and for embedding the gateway without a running store.
//!
//! Supported:
//! - Query operators: `in`, `nin`, `ne`, `exists`, `gt`, `gte`, `lt`, `lte`
//! - Update operators: `set`, `unset`, `inc`, or whole-document replacement
//! - The `findandmodify` command (remove or update)
//! - Chunked file storage with `<prefix>.files` / `<prefix>.chunks`
//!
//! Operator keywords use the database's operator prefix (`$` by default).

mod collection;
mod database;
mod grid_fs;
mod matcher;

pub use collection::MemoryCollection;
pub use database::MemoryDatabase;
pub use grid_fs::{MemoryGridFs, DEFAULT_CHUNK_SIZE};
