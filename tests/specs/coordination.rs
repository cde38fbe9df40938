// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end coordination specs exercising the full request/response cycle.

use crate::prelude::*;
use iq_coord::{CoordConfig, CoordError, Coordinator, USER_REJECTED_RESPONSE};
use iq_core::{CallId, SessionState};
use std::time::Duration;

#[tokio::test]
async fn answered_session_resolves_with_the_formatted_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let coordinator = Coordinator::new(store.clone(), CoordConfig::default());

    let responder = tokio::spawn({
        let store = store.clone();
        async move {
            let id = discover_session(&store).await;
            store
                .save_session_answers(&id, &[select("Blue")], None)
                .await
                .unwrap();
        }
    });

    let outcome = coordinator
        .start_session(&color_questions(), None)
        .await
        .unwrap();
    responder.await.unwrap();

    assert_eq!(
        outcome.formatted_response,
        "Here are the user's answers:\n\n1. Favorite color?\n→ Blue — The color of sky"
    );
    let status = store
        .get_session_status(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status, SessionState::Completed);
}

#[tokio::test]
async fn rejection_resolves_successfully_with_the_fixed_notice() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let coordinator = Coordinator::new(store.clone(), CoordConfig::default());

    let responder = tokio::spawn({
        let store = store.clone();
        async move {
            let id = discover_session(&store).await;
            store.reject_session(&id).await.unwrap();
        }
    });

    let outcome = coordinator
        .start_session(&color_questions(), None)
        .await
        .unwrap();
    responder.await.unwrap();

    assert_eq!(outcome.formatted_response, USER_REJECTED_RESPONSE);
    let status = store
        .get_session_status(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status, SessionState::Rejected);
}

#[tokio::test]
async fn unanswered_session_times_out_and_is_marked_timed_out() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let mut config = CoordConfig::with_timeout(Duration::from_millis(500));
    config.poll_interval = Duration::from_millis(25);
    let coordinator = Coordinator::new(store.clone(), config);

    let err = coordinator
        .start_session(&color_questions(), None)
        .await
        .unwrap_err();

    let id = match &err {
        CoordError::Timeout(id) => id.clone(),
        other => panic!("expected timeout, got {other}"),
    };
    assert!(err.to_string().contains("timed out"));

    let status = store.get_session_status(&id).await.unwrap().unwrap();
    assert_eq!(status.status, SessionState::TimedOut);
}

#[tokio::test]
async fn answers_from_a_different_call_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(&dir);
    let mut config = CoordConfig::with_timeout(Duration::from_millis(500));
    config.poll_interval = Duration::from_millis(25);
    let coordinator = Coordinator::new(store.clone(), config);

    let responder = tokio::spawn({
        let store = store.clone();
        async move {
            let id = discover_session(&store).await;
            store
                .save_session_answers(&id, &[select("Blue")], Some(&CallId::new("someone-else")))
                .await
                .unwrap();
        }
    });

    let err = coordinator
        .start_session(&color_questions(), Some(CallId::new("this-call")))
        .await
        .unwrap_err();
    responder.await.unwrap();

    assert!(matches!(err, CoordError::Timeout(_)));
}
