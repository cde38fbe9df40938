// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for the behavioral specs.

use iq_core::{Answer, Question, QuestionOption, SystemClock};
use iq_store::{SessionStore, StoreConfig};
use std::time::Duration;

/// The canonical single-question fixture used across the specs.
pub fn color_questions() -> Vec<Question> {
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

pub fn select(label: &str) -> Answer {
    Answer {
        question_index: 0,
        selected_option: Some(label.to_string()),
        selected_options: None,
        custom_text: None,
        timestamp: 1,
    }
}

pub fn store_in(dir: &tempfile::TempDir) -> SessionStore<SystemClock> {
    let mut config = StoreConfig::with_session_dir(dir.path());
    config.lock_timeout = Duration::from_secs(2);
    SessionStore::new(config)
}

/// Poll until a session exists, standing in for the consumer's watcher.
pub async fn discover_session(store: &SessionStore<SystemClock>) -> iq_core::SessionId {
    loop {
        if let Some(id) = store.list_sessions().unwrap().into_iter().next() {
            return id;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
