//! Integration test: malformed stored records are repaired on read.

use std::fs;

use serde_json::Value;
use todokeep::{RecordStore, SequentialIdGenerator};

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
}

#[test]
fn list_drops_blank_title_and_persists_repair() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(
        &path,
        r#"{
            "version": 1,
            "identities": {
                "alice": { "records": [
                    { "id": "good", "title": "Water plants", "completed": false },
                    { "id": "bad", "title": "   ", "completed": true }
                ] }
            }
        }"#,
    )
    .unwrap();

    let store = RecordStore::open(&path).unwrap();
    let first = store.list("alice").unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, "good");
    assert_eq!(first[0].title, "Water plants");

    let on_disk = read_json(&path);
    let records = on_disk["identities"]["alice"]["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["id"], "good");

    let second = store.list("alice").unwrap();
    assert_eq!(second, first);
}

#[test]
fn list_assigns_ids_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(
        &path,
        r#"{"version":1,"identities":{"alice":{"records":[{"title":"no id yet"}]}}}"#,
    )
    .unwrap();

    let store = RecordStore::with_id_generator(&path, SequentialIdGenerator::new("fix")).unwrap();
    let first = store.list("alice").unwrap();
    assert!(first[0].id.starts_with("fix-"));
    assert!(!first[0].completed);

    // The repaired id was persisted, so a second read does not mint another.
    let second = store.list("alice").unwrap();
    assert_eq!(second[0].id, first[0].id);
}

#[test]
fn well_formed_document_is_not_rewritten_by_list() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    let original = r#"{"version":1,"identities":{"alice":{"records":[{"id":"a","title":"t","completed":true}]}}}"#;
    fs::write(&path, original).unwrap();

    let store = RecordStore::open(&path).unwrap();
    assert_eq!(store.list("alice").unwrap().len(), 1);
    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn corrupt_document_is_a_storage_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(&path, "{\"version\": 1, \"identities\": ").unwrap();

    let store = RecordStore::open(&path).unwrap();
    assert!(matches!(
        store.list("alice"),
        Err(todokeep::TodoError::Storage(_))
    ));
    assert!(matches!(
        store.add("alice", "x"),
        Err(todokeep::TodoError::Storage(_))
    ));
    // The corrupt file is left for an operator to inspect.
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "{\"version\": 1, \"identities\": "
    );
}

#[test]
fn repair_of_one_identity_keeps_others() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    fs::write(
        &path,
        r#"{"version":1,"identities":{
            "alice":{"records":[{"id":"a","title":"  trim me  ","completed":false}]},
            "bob":{"records":[{"id":"b","title":"bob's","completed":true}]}
        }}"#,
    )
    .unwrap();

    let store = RecordStore::open(&path).unwrap();
    assert_eq!(store.list("alice").unwrap()[0].title, "trim me");

    let on_disk = read_json(&path);
    assert_eq!(on_disk["identities"]["alice"]["records"][0]["title"], "trim me");
    assert_eq!(on_disk["identities"]["bob"]["records"][0]["title"], "bob's");
}
