//! Concurrent access tests for the persisted session store
//!
//! The CLI can run several `sendo` processes against one Sendo directory.
//! These tests open many independent store handles on the same directory
//! and check that the fs2 lock keeps `storage.json` readable and complete.
//!
//! Run with: cargo test --test concurrent_access_test -- --nocapture

use std::sync::{Arc, Barrier};
use std::thread;

use tempfile::TempDir;

use sendo_core::adapters::file_store::JsonFileStore;
use sendo_core::ports::KeyValueStore;

#[test]
fn test_concurrent_writers_keep_every_key() {
    let dir = TempDir::new().unwrap();
    let threads = 8;
    let per_thread = 20;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let path = dir.path().to_path_buf();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let store = JsonFileStore::new(&path);
                barrier.wait();
                for i in 0..per_thread {
                    store
                        .set(&format!("key-{}-{}", t, i), &format!("\"value-{}\"", i))
                        .expect("write should succeed under contention");
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("writer thread panicked");
    }

    let store = JsonFileStore::new(dir.path());
    for t in 0..threads {
        for i in 0..per_thread {
            assert_eq!(
                store.get(&format!("key-{}-{}", t, i)).unwrap(),
                Some(format!("\"value-{}\"", i))
            );
        }
    }
}

#[test]
fn test_readers_never_see_partial_file() {
    let dir = TempDir::new().unwrap();
    let writer_store = JsonFileStore::new(dir.path());
    writer_store.set("login-sendo", "{}").unwrap();

    let path = dir.path().to_path_buf();
    let writer = thread::spawn(move || {
        let store = JsonFileStore::new(&path);
        for i in 0..100 {
            store.set("login-sendo", &format!("{{\"n\":{}}}", i)).unwrap();
            store.remove("user-info").unwrap();
            store.set("user-info", "{\"id\":7}").unwrap();
        }
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let path = dir.path().to_path_buf();
            thread::spawn(move || {
                let store = JsonFileStore::new(&path);
                for _ in 0..100 {
                    let value = store.get("login-sendo").expect("read should not fail");
                    assert!(value.is_some());
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(
        writer_store.get("login-sendo").unwrap(),
        Some("{\"n\":99}".to_string())
    );
}
