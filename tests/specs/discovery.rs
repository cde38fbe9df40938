// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery specs: the consumer-side watcher sees sessions created by the
//! producer, whether they already exist or arrive while watching.

use crate::prelude::*;
use iq_watch::SessionWatcher;
use std::time::Duration;

#[tokio::test]
async fn existing_sessions_are_listed_before_any_event_arrives() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let id = store.create_session(&color_questions()).await.unwrap();

    let watcher = SessionWatcher::new(store.clone());
    let pending = watcher.list_pending_sessions().await.unwrap();
    assert_eq!(pending, vec![id.clone()]);

    let request = watcher.load_session(&id).await.unwrap().unwrap();
    assert_eq!(request.questions, color_questions());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn a_session_created_after_subscribing_is_announced() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let watcher = SessionWatcher::new(store.clone());
    let mut events = watcher.subscribe().unwrap();

    let id = store.create_session(&color_questions()).await.unwrap();

    let announced = tokio::time::timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("no discovery event within 10s")
        .expect("event channel closed");
    assert_eq!(announced.session_id, id);
    let request = announced.request.expect("request should load with the event");
    assert_eq!(request.session_id, id);
}

#[tokio::test]
async fn answered_sessions_drop_out_of_the_pending_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let id = store.create_session(&color_questions()).await.unwrap();
    store
        .save_session_answers(&id, &[select("Red")], None)
        .await
        .unwrap();

    let watcher = SessionWatcher::new(store);
    assert!(watcher.list_pending_sessions().await.unwrap().is_empty());
}
