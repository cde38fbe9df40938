// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use iq_core::{Answer, QuestionOption};
use iq_store::{StoreConfig, ANSWERS_FILE};
use std::time::Duration;

fn questions() -> Vec<Question> {
    vec![Question {
        title: "Color".to_string(),
        prompt: "Favorite color?".to_string(),
        options: vec![
            QuestionOption::new("Red"),
            QuestionOption::with_description("Blue", "The color of sky"),
        ],
        multi_select: false,
    }]
}

fn answer(label: &str) -> Answer {
    Answer {
        question_index: 0,
        selected_option: Some(label.to_string()),
        selected_options: None,
        custom_text: None,
        timestamp: 1,
    }
}

fn setup(
    dir: &tempfile::TempDir,
    session_timeout: Duration,
) -> (Coordinator, SessionStore<SystemClock>) {
    let store = SessionStore::new(StoreConfig::with_session_dir(dir.path()));
    let config = CoordConfig {
        session_timeout,
        poll_interval: Duration::from_millis(20),
    };
    (Coordinator::new(store.clone(), config), store)
}

/// Wait until the producer's session shows up, standing in for the
/// consumer-side watcher.
async fn discover_session(store: &SessionStore<SystemClock>) -> SessionId {
    loop {
        if let Some(id) = store.list_sessions().unwrap().into_iter().next() {
            return id;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn happy_path_returns_exact_transcript() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, store) = setup(&dir, Duration::ZERO);

    let consumer = tokio::spawn(async move {
        let id = discover_session(&store).await;
        store
            .save_session_answers(&id, &[answer("Blue")], None)
            .await
            .unwrap();
    });

    let outcome = coordinator.start_session(&questions(), None).await.unwrap();
    assert_eq!(
        outcome.formatted_response,
        "Here are the user's answers:\n\n1. Favorite color?\n→ Blue — The color of sky"
    );
    consumer.await.unwrap();
}

#[tokio::test]
async fn rejection_is_a_successful_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, store) = setup(&dir, Duration::ZERO);
    let observer = store.clone();

    let consumer = tokio::spawn(async move {
        let id = discover_session(&store).await;
        store.reject_session(&id).await.unwrap();
    });

    let outcome = coordinator.start_session(&questions(), None).await.unwrap();
    assert_eq!(outcome.formatted_response, USER_REJECTED_RESPONSE);
    consumer.await.unwrap();

    let status = observer
        .get_session_status(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.status, SessionState::Rejected);
}

#[tokio::test]
async fn timeout_raises_and_marks_timed_out() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, store) = setup(&dir, Duration::from_millis(500));

    let err = coordinator
        .start_session(&questions(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("timed out"), "got: {err}");

    let id = match err {
        CoordError::Timeout(id) => id,
        other => panic!("expected timeout, got {other:?}"),
    };
    let status = store.get_session_status(&id).await.unwrap().unwrap();
    assert_eq!(status.status, SessionState::TimedOut);
}

#[tokio::test]
async fn unknown_option_marks_abandoned_and_names_it() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, store) = setup(&dir, Duration::ZERO);
    let observer = store.clone();

    let consumer = tokio::spawn(async move {
        let id = discover_session(&store).await;
        store
            .save_session_answers(&id, &[answer("Z")], None)
            .await
            .unwrap();
    });

    let err = coordinator
        .start_session(&questions(), None)
        .await
        .unwrap_err();
    consumer.await.unwrap();

    let id = match &err {
        CoordError::InvalidAnswers { id, .. } => id.clone(),
        other => panic!("expected validation failure, got {other:?}"),
    };
    assert!(err.to_string().contains("\"Z\""), "got: {err}");

    let status = observer.get_session_status(&id).await.unwrap().unwrap();
    assert_eq!(status.status, SessionState::Abandoned);
}

#[tokio::test]
async fn corrupt_answers_marks_abandoned() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, store) = setup(&dir, Duration::ZERO);
    let observer = store.clone();

    let consumer = tokio::spawn(async move {
        let id = discover_session(&store).await;
        std::fs::write(store.session_dir(&id).join(ANSWERS_FILE), b"]]]").unwrap();
    });

    let err = coordinator
        .start_session(&questions(), None)
        .await
        .unwrap_err();
    consumer.await.unwrap();
    assert!(matches!(err, CoordError::Store(StoreError::Corrupt { .. })));

    let id = observer.list_sessions().unwrap().remove(0);
    let status = observer.get_session_status(&id).await.unwrap().unwrap();
    assert_eq!(status.status, SessionState::Abandoned);
}

#[tokio::test]
async fn foreign_call_id_is_ignored_until_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, store) = setup(&dir, Duration::from_millis(800));

    let consumer = tokio::spawn(async move {
        let id = discover_session(&store).await;
        store
            .save_session_answers(&id, &[answer("Blue")], Some(&CallId::new("someone-else")))
            .await
            .unwrap();
    });

    let err = coordinator
        .start_session(&questions(), Some(CallId::new("mine")))
        .await
        .unwrap_err();
    consumer.await.unwrap();
    assert!(matches!(err, CoordError::Timeout(_)));
}

#[tokio::test]
async fn matching_call_id_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let (coordinator, store) = setup(&dir, Duration::ZERO);

    let consumer = tokio::spawn(async move {
        let id = discover_session(&store).await;
        store
            .save_session_answers(&id, &[answer("Red")], Some(&CallId::new("mine")))
            .await
            .unwrap();
    });

    let outcome = coordinator
        .start_session(&questions(), Some(CallId::new("mine")))
        .await
        .unwrap();
    consumer.await.unwrap();
    assert_eq!(
        outcome.formatted_response,
        "Here are the user's answers:\n\n1. Favorite color?\n→ Red"
    );

    let request = coordinator
        .store()
        .get_session_request(&outcome.session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(request.call_id, Some(CallId::new("mine")));
}
