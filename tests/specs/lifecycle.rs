// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session lifecycle specs: round trip, deletion, retention, concurrency.

use crate::prelude::*;
use iq_core::{FakeClock, SessionId};
use iq_store::{SessionStore, StoreConfig};
use std::collections::HashSet;

#[tokio::test]
async fn created_session_round_trips_questions_and_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let id = store.create_session(&color_questions()).await.unwrap();
    let request = store.get_session_request(&id).await.unwrap().unwrap();

    assert_eq!(request.session_id, id);
    assert_eq!(request.questions, color_questions());
}

#[tokio::test]
async fn delete_never_raises_for_missing_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let id = store.create_session(&color_questions()).await.unwrap();
    store.delete_session(&id).await.unwrap();
    store.delete_session(&id).await.unwrap();
    store.delete_session(&SessionId::generate()).await.unwrap();
}

#[tokio::test]
async fn retention_is_independent_of_the_wait_timeout() {
    // A session that would wait forever (sessionTimeout=0) still ages out of
    // the store — and is not removed a moment before the window elapses.
    let dir = tempfile::tempdir().unwrap();
    let day_ms: u64 = 24 * 60 * 60 * 1000;
    let clock = FakeClock::at(day_ms);
    let store = SessionStore::with_clock(StoreConfig::with_session_dir(dir.path()), clock.clone());

    let id = store.create_session(&color_questions()).await.unwrap();

    // Six days later: still pending, still retained.
    clock.set(7 * day_ms);
    assert_eq!(store.cleanup_expired_sessions().await.unwrap(), 0);
    assert!(store.session_dir(&id).exists());

    // Past the seven-day window: swept despite being pending.
    clock.set(9 * day_ms);
    assert_eq!(store.cleanup_expired_sessions().await.unwrap(), 1);
    assert!(!store.session_dir(&id).exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn fifty_concurrent_creations_yield_distinct_readable_sessions() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);

    let mut handles = Vec::new();
    for _ in 0..50 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.create_session(&color_questions()).await.unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let id = handle.await.unwrap();
        assert!(store.get_session_request(&id).await.unwrap().is_some());
        assert!(ids.insert(id));
    }
    assert_eq!(ids.len(), 50);
}
