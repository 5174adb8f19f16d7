//! Concurrency test: many writers against one document.
//!
//! Every load-mutate-persist cycle is serialized, so no write is lost.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use todokeep::{RecordPatch, RecordStore};

#[test]
fn stress_concurrent_adds_lose_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")).unwrap());

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.add("alice", &format!("item-{i}")).unwrap())
        })
        .collect();
    let created: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let listed = store.list("alice").unwrap();
    assert_eq!(listed.len(), 32);

    let ids: HashSet<&str> = listed.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids.len(), 32, "record ids must be unique");
    for record in &created {
        assert!(ids.contains(record.id.as_str()));
    }
}

#[test]
fn stress_concurrent_adds_through_separate_handles() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let path = path.clone();
            thread::spawn(move || {
                let store = RecordStore::open(&path).unwrap();
                for j in 0..5 {
                    store.add("alice", &format!("item-{i}-{j}")).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let store = RecordStore::open(&path).unwrap();
    assert_eq!(store.list("alice").unwrap().len(), 80);
}

#[test]
fn stress_mixed_writers_and_readers() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")).unwrap());

    let seeded: Vec<_> = (0..20)
        .map(|i| store.add("alice", &format!("seed-{i}")).unwrap())
        .collect();

    let mut handles = Vec::new();
    for record in seeded.iter().cloned() {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            store
                .update("alice", &record.id, &RecordPatch::new().completed(true))
                .unwrap();
        }));
    }
    for i in 0..20 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            store.add("bob", &format!("bob-{i}")).unwrap();
        }));
    }
    for _ in 0..10 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            // Readers never observe a half-written document.
            let len = store.list("alice").unwrap().len();
            assert_eq!(len, 20);
        }));
    }
    for h in handles {
        h.join().unwrap();
    }

    let alice = store.list("alice").unwrap();
    assert_eq!(alice.len(), 20);
    assert!(alice.iter().all(|r| r.completed));
    assert_eq!(store.list("bob").unwrap().len(), 20);
}

#[test]
fn stress_concurrent_deletes_each_succeed_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RecordStore::open(dir.path().join("data.json")).unwrap());
    let record = store.add("alice", "contested").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let id = record.id.clone();
            thread::spawn(move || store.delete("alice", &id).is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert!(store.list("alice").unwrap().is_empty());
}
