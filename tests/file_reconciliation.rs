//! File Reconciliation Tests
//!
//! - Batch inserts of file-backed types store each document separately
//! - Clean payloads are never stored again
//! - Payload updates run find-and-remove, store, then the residual update
//! - A failed store after the removal leaves the document removed

mod common;

use std::sync::Arc;

use common::{file_gateway, plain_gateway, Journal, RecordingHub};
use docgate::doc;
use docgate::driver::memory::MemoryDatabase;
use docgate::driver::FileStore;
use docgate::file::PayloadState;
use docgate::{
    Configuration, Document, EventManager, FilePayload, Gateway, MappedType, StoredFile,
    UpdateResult, Value,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn with_payload(document: Document, payload: &FilePayload) -> Document {
    document.with("file", payload.clone())
}

fn set_update(fields: Document) -> Document {
    Document::new().with("$set", fields)
}

fn memory_images() -> (Arc<MemoryDatabase>, Gateway) {
    let db = Arc::new(MemoryDatabase::new("app"));
    let gateway = Gateway::new(
        Arc::new(db.grid_fs("fs")),
        db.clone(),
        Arc::new(MappedType::new("Image", "app", "fs.files").with_file("file")),
        Arc::new(EventManager::new()),
        &Configuration::default(),
    );
    (db, gateway)
}

// =============================================================================
// Batch Insert Routing
// =============================================================================

#[test]
fn test_file_batch_insert_stores_each_document() {
    let journal = Journal::new();
    let (gateway, _, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));

    let documents = vec![
        with_payload(doc! { "title": "a" }, &FilePayload::from_bytes(b"a".to_vec())),
        with_payload(doc! { "title": "b" }, &FilePayload::from_bytes(b"b".to_vec())),
        with_payload(doc! { "title": "c" }, &FilePayload::from_bytes(b"c".to_vec())),
    ];
    let returned = gateway.batch_insert(documents, &doc! {}).unwrap();

    assert_eq!(journal.count("storeBytes"), 3);
    assert_eq!(journal.count("batchInsert"), 0);
    assert_eq!(returned.len(), 3);
    for document in &returned {
        let payload = document.get("file").and_then(Value::as_file).unwrap();
        assert_eq!(payload.state(), PayloadState::Persisted);
    }
}

#[test]
fn test_plain_batch_insert_is_one_call() {
    let journal = Journal::new();
    let (gateway, _) = plain_gateway(
        &journal,
        MappedType::new("User", "app", "users"),
        RecordingHub::new(&journal, &[]),
    );

    gateway
        .batch_insert(vec![doc! { "a": 1 }, doc! { "a": 2 }], &doc! { "safe": true })
        .unwrap();

    assert_eq!(journal.names(), vec!["batchInsert"]);
    let call = journal.find("batchInsert").unwrap();
    assert_eq!(call.documents.len(), 3);
    assert_eq!(call.documents[2], doc! { "safe": true });
}

#[test]
fn test_file_batch_insert_stops_at_first_failure() {
    let journal = Journal::new();
    let (gateway, grid, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));
    grid.fail_stores();

    let documents = vec![
        with_payload(doc! {}, &FilePayload::from_bytes(b"a".to_vec())),
        with_payload(doc! {}, &FilePayload::from_bytes(b"b".to_vec())),
    ];
    assert!(gateway.batch_insert(documents, &doc! {}).is_err());
    assert_eq!(journal.count("storeBytes"), 1);
}

// =============================================================================
// Insert File
// =============================================================================

#[test]
fn test_insert_file_strips_payload_from_metadata() {
    let journal = Journal::new();
    let (gateway, _, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));

    let payload = FilePayload::from_bytes(b"png".to_vec());
    gateway
        .insert_file(with_payload(doc! { "_id": "f1", "title": "cat" }, &payload))
        .unwrap();

    let call = journal.find("storeBytes").unwrap();
    assert_eq!(call.documents[0], doc! { "_id": "f1", "title": "cat" });

    let handle = payload.stored().unwrap();
    assert_eq!(handle.id, Value::from("f1"));
    assert_eq!(handle.collection, "fs.files");
}

#[test]
fn test_insert_file_path_mode() {
    let tmp = tempfile::TempDir::new().unwrap();
    let path = tmp.path().join("cat.png");
    std::fs::write(&path, b"meow").unwrap();

    let journal = Journal::new();
    let (gateway, _, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));

    gateway
        .insert_file(with_payload(doc! {}, &FilePayload::from_path(&path)))
        .unwrap();

    assert_eq!(journal.store_calls(), vec!["storeFile"]);
}

#[test]
fn test_insert_file_is_idempotent() {
    let journal = Journal::new();
    let (gateway, _, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));

    let payload = FilePayload::from_bytes(b"once".to_vec());
    let document = gateway
        .insert_file(with_payload(doc! { "title": "x" }, &payload))
        .unwrap();
    assert!(!payload.is_dirty());

    gateway.insert_file(document).unwrap();
    assert_eq!(journal.count("storeBytes"), 1);
}

#[test]
fn test_insert_file_without_payload_is_noop() {
    let journal = Journal::new();
    let (gateway, _, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));

    let document = doc! { "title": "no file" };
    assert_eq!(gateway.insert_file(document.clone()).unwrap(), document);
    assert!(journal.store_calls().is_empty());
}

#[test]
fn test_insert_file_duplicate_id_keeps_original_content() {
    let (db, gateway) = memory_images();

    let original = FilePayload::from_bytes(b"original".to_vec());
    gateway
        .insert_file(with_payload(doc! { "_id": "img" }, &original))
        .unwrap();

    let err = gateway
        .insert_file(with_payload(
            doc! { "_id": "img" },
            &FilePayload::from_bytes(b"dup".to_vec()),
        ))
        .unwrap_err();
    assert_eq!(err.code(), "DRIVER_COMMAND_FAILED");

    let handle = original.stored().unwrap();
    let grid = db.grid_fs("fs");
    assert_eq!(grid.read_bytes(&handle).unwrap(), b"original");
    assert_eq!(grid.files_collection().len(), 1);
}

// =============================================================================
// Update File
// =============================================================================

#[test]
fn test_update_file_dirty_payload_with_residual_fields() {
    let journal = Journal::new();
    let (gateway, _, db) = file_gateway(&journal, RecordingHub::new(&journal, &[]));
    db.will_remove(doc! {
        "_id": "f1",
        "title": "old",
        "owner": "jwage",
        "filename": "cat.png",
        "length": 3,
        "chunkSize": 261120,
        "uploadDate": "2024-01-01T00:00:00+00:00",
        "checksum": "abc",
        "file": null
    });

    let payload = FilePayload::from_bytes(b"new content".to_vec());
    let update = set_update(with_payload(doc! { "title": "new" }, &payload));
    let returned = gateway
        .update_file(&doc! { "_id": "f1" }, update, &doc! {})
        .unwrap();

    assert_eq!(
        journal.names(),
        vec!["findandmodify", "chunks.remove", "storeBytes", "update"]
    );

    let command = &journal.find("findandmodify").unwrap().documents[0];
    assert_eq!(command.get_str("findandmodify"), Some("fs.files"));
    assert_eq!(command.get_document("query"), Some(&doc! { "_id": "f1" }));
    assert_eq!(command.get("remove"), Some(&Value::Bool(true)));

    let chunk_filter = &journal.find("chunks.remove").unwrap().documents[0];
    assert_eq!(chunk_filter, &doc! { "files_id": "f1" });

    // Sidecar fields and the payload field are not re-attached
    let metadata = &journal.find("storeBytes").unwrap().documents[0];
    assert_eq!(metadata, &doc! { "_id": "f1", "title": "old", "owner": "jwage" });

    let residual = journal.find("update").unwrap();
    assert_eq!(residual.documents[0], doc! { "_id": "f1" });
    assert_eq!(residual.documents[1], doc! { "$set": { "title": "new" } });

    assert_eq!(returned, doc! { "$set": { "title": "new" } });
    assert_eq!(payload.state(), PayloadState::Persisted);
}

#[test]
fn test_update_file_payload_only_skips_residual_update() {
    let journal = Journal::new();
    let (gateway, _, db) = file_gateway(&journal, RecordingHub::new(&journal, &[]));
    db.will_remove(doc! { "_id": "f1" });

    let payload = FilePayload::from_bytes(b"x".to_vec());
    let returned = gateway
        .update_file(&doc! { "_id": "f1" }, set_update(with_payload(doc! {}, &payload)), &doc! {})
        .unwrap();

    assert!(returned.is_empty());
    assert_eq!(journal.count("update"), 0);
}

#[test]
fn test_update_file_clean_payload_is_plain_update() {
    let journal = Journal::new();
    let (gateway, _, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));

    let stored = StoredFile::new(Value::from("f1"), "fs.files", doc! { "_id": "f1" });
    let payload = FilePayload::from_stored(stored);
    let update = set_update(with_payload(doc! { "title": "new" }, &payload));

    let result = gateway.update(&doc! { "_id": "f1" }, update, &doc! {}).unwrap();

    assert_eq!(journal.names(), vec!["update"]);
    assert_eq!(result, UpdateResult::File(doc! { "$set": { "title": "new" } }));
}

#[test]
fn test_update_file_nothing_removed_stores_with_empty_metadata() {
    let journal = Journal::new();
    let (gateway, _, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));

    let payload = FilePayload::from_bytes(b"x".to_vec());
    gateway
        .update_file(&doc! { "_id": "gone" }, set_update(with_payload(doc! {}, &payload)), &doc! {})
        .unwrap();

    assert_eq!(journal.names(), vec!["findandmodify", "storeBytes"]);
    assert_eq!(journal.find("storeBytes").unwrap().documents[0], doc! {});
}

#[test]
fn test_update_file_respects_operator_prefix() {
    let journal = Journal::new();
    let grid = Arc::new(common::RecordingGridFs::new(&journal));
    let db = Arc::new(common::RecordingDatabase::new(&journal));
    db.will_remove(doc! { "_id": "f1" });
    let gateway = Gateway::new(
        grid,
        db,
        Arc::new(MappedType::new("Image", "app", "fs.files").with_file("file")),
        Arc::new(RecordingHub::new(&journal, &[])),
        &Configuration::default().with_operator_prefix("#"),
    );

    let payload = FilePayload::from_bytes(b"x".to_vec());
    let update = Document::new().with("#set", with_payload(doc! {}, &payload));
    gateway.update_file(&doc! { "_id": "f1" }, update, &doc! {}).unwrap();

    assert_eq!(journal.count("storeBytes"), 1);
}

// =============================================================================
// Failure Window
// =============================================================================

/// The store failing after find-and-remove leaves the document removed.
/// Nothing is rolled back and the error reaches the caller.
#[test]
fn test_store_failure_after_removal_loses_document() {
    let journal = Journal::new();
    let (gateway, grid, db) = file_gateway(&journal, RecordingHub::new(&journal, &[]));
    db.will_remove(doc! { "_id": "f1", "title": "keep me" });
    grid.fail_stores();

    let payload = FilePayload::from_bytes(b"x".to_vec());
    let update = set_update(with_payload(doc! { "title": "new" }, &payload));
    let err = gateway
        .update_file(&doc! { "_id": "f1" }, update, &doc! {})
        .unwrap_err();

    assert_eq!(err.code(), "DRIVER_IO");
    assert_eq!(
        journal.names(),
        vec!["findandmodify", "chunks.remove", "storeBytes"]
    );
    assert!(payload.is_dirty());
}

#[test]
fn test_store_failure_after_removal_in_memory_store() {
    let (db, gateway) = memory_images();

    let payload = FilePayload::from_bytes(b"v1".to_vec());
    gateway
        .insert_file(with_payload(doc! { "_id": "img", "title": "cat" }, &payload))
        .unwrap();
    let grid = db.grid_fs("fs");
    assert_eq!(grid.files_collection().len(), 1);

    // A path that cannot be read makes the store fail after the removal
    payload.set_path("/nonexistent/docgate/cat.png");
    let update = set_update(with_payload(doc! {}, &payload));
    let err = gateway
        .update_file(&doc! { "_id": "img" }, update, &doc! {})
        .unwrap_err();

    assert_eq!(err.code(), "DRIVER_IO");
    assert!(grid.files_collection().is_empty());
    assert!(grid.chunks_collection().is_empty());
}

// =============================================================================
// Find One
// =============================================================================

#[test]
fn test_find_one_flattens_file_handle() {
    let journal = Journal::new();
    let (gateway, grid, _) = file_gateway(&journal, RecordingHub::new(&journal, &[]));
    *grid.stored_file.lock().unwrap() = Some(StoredFile::new(
        Value::from("f1"),
        "fs.files",
        doc! { "_id": "f1", "title": "cat", "length": 3 },
    ));

    let found = gateway
        .find_one(doc! { "title": "cat" }, &doc! {})
        .unwrap()
        .unwrap();

    assert_eq!(journal.store_calls(), vec!["findOneFile"]);
    assert_eq!(found.get_str("title"), Some("cat"));
    let handle = found.get("file").and_then(Value::as_file).unwrap();
    assert_eq!(handle.state(), PayloadState::Persisted);
    assert_eq!(handle.stored().unwrap().id, Value::from("f1"));
}

#[test]
fn test_find_one_file_round_trip_in_memory_store() {
    let (db, gateway) = memory_images();

    gateway
        .insert_file(with_payload(
            doc! { "title": "cat" },
            &FilePayload::from_bytes(b"meow".to_vec()),
        ))
        .unwrap();

    let found = gateway
        .find_one(doc! { "title": "cat" }, &doc! {})
        .unwrap()
        .unwrap();
    let handle = found
        .get("file")
        .and_then(Value::as_file)
        .and_then(|p| p.stored())
        .unwrap();

    assert_eq!(db.grid_fs("fs").read_bytes(&handle).unwrap(), b"meow");
}
