//! # File Payloads
//!
//! Large binary payloads live in a chunked sidecar store next to the primary
//! collection. The chunked store cannot update a file in place, so changing a
//! payload means removing the stored file and recreating it.

mod payload;
mod reconciler;

pub use payload::{FilePayload, PayloadState, PendingSource, StoredFile};
pub use reconciler::{FileReconciler, SIDECAR_FIELDS};
