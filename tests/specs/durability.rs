// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durability specs: readers never observe torn writes, stale locks are
//! reclaimed, and every surviving payload is a complete write.

use crate::prelude::*;
use iq_store::{AtomicStore, FileLock, StoreConfig};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_writers_leave_exactly_one_complete_payload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("contested.json");
    let store = AtomicStore::new(&StoreConfig::with_session_dir(dir.path()));

    let mut handles = Vec::new();
    for n in 0..20u32 {
        let store = store.clone();
        let path = path.clone();
        handles.push(tokio::spawn(async move {
            let payload = format!("{{\"writer\":{n},\"body\":\"{}\"}}", "x".repeat(256));
            store.write(&path, payload.as_bytes(), 0o600).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let bytes = store.read(&path).await.unwrap().unwrap();
    let doc: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(doc["body"].as_str().unwrap().len(), 256);
    // No temp or lock debris once every writer has finished.
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().into_string().unwrap())
        .filter(|name| name != "contested.json")
        .collect();
    assert!(leftovers.is_empty(), "debris left behind: {leftovers:?}");
}

#[tokio::test]
async fn stale_lock_from_a_dead_process_is_reclaimed_quickly() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("status.json");
    // Claim the lock on behalf of a real process that has already exited.
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    std::fs::write(dir.path().join("status.json.lock"), pid.to_string()).unwrap();

    let start = std::time::Instant::now();
    let lock = FileLock::acquire(&target, Duration::from_secs(2)).await.unwrap();
    assert!(start.elapsed() < Duration::from_millis(500));
    drop(lock);
    assert!(!dir.path().join("status.json.lock").exists());
}

#[tokio::test]
async fn a_session_survives_a_crashed_writer_mid_update() {
    // A temp file abandoned by a dying writer must not shadow the document.
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let id = store.create_session(&color_questions()).await.unwrap();
    let session_dir = store.session_dir(&id);
    std::fs::write(session_dir.join(".status.json.99999.1.tmp"), b"{trunc").unwrap();

    let status = store.get_session_status(&id).await.unwrap().unwrap();
    assert_eq!(status.total_questions, 1);
    store.delete_session(&id).await.unwrap();
    assert!(!session_dir.exists());
}
