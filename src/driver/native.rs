//! Native operations the gateway forwards without wrapping

use crate::document::Document;

/// A native collection operation outside the gateway's wrapped surface.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeOp {
    /// Insert one document; yields its `_id`
    Insert { document: Document, options: Document },
    /// Insert or replace by `_id`; yields the `_id`
    Save { document: Document, options: Document },
    /// Remove matching documents; yields the count removed
    Remove { criteria: Document, options: Document },
    /// Count matching documents
    Count { query: Document },
    /// Drop the collection
    Drop,
    /// The collection name
    GetName,
}

impl NativeOp {
    /// Every forwarded method name
    pub const METHODS: [&'static str; 6] = ["insert", "save", "remove", "count", "drop", "getName"];

    /// Method name as callers spell it
    pub fn method(&self) -> &'static str {
        match self {
            Self::Insert { .. } => "insert",
            Self::Save { .. } => "save",
            Self::Remove { .. } => "remove",
            Self::Count { .. } => "count",
            Self::Drop => "drop",
            Self::GetName => "getName",
        }
    }
}
