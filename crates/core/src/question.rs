// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Question payload types and their validation.
//!
//! Validation is a hand-written function returning a structured issue list
//! rather than a runtime schema: the recognized shape is enumerated in code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum options per question.
pub const MIN_OPTIONS: usize = 2;
/// Maximum options per question.
pub const MAX_OPTIONS: usize = 10;

/// A single selectable option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl QuestionOption {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: None,
        }
    }

    pub fn with_description(label: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            description: Some(description.into()),
        }
    }
}

/// One question posed to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Short title shown in session lists.
    pub title: String,
    /// The full prompt shown to the user.
    pub prompt: String,
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub multi_select: bool,
}

/// A rejected question list, with one message per problem found.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid questions: {}", issues.join("; "))]
pub struct QuestionError {
    pub issues: Vec<String>,
}

/// Validate a question list before it reaches the filesystem.
///
/// Collects every problem rather than stopping at the first.
pub fn validate_questions(questions: &[Question]) -> Result<(), QuestionError> {
    let mut issues = Vec::new();

    if questions.is_empty() {
        issues.push("question list is empty".to_string());
    }

    for (i, question) in questions.iter().enumerate() {
        if question.title.trim().is_empty() {
            issues.push(format!("question {i} has an empty title"));
        }
        if question.prompt.trim().is_empty() {
            issues.push(format!("question {i} has an empty prompt"));
        }
        let count = question.options.len();
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&count) {
            issues.push(format!(
                "question {i} has {count} options (must be {MIN_OPTIONS}-{MAX_OPTIONS})"
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for option in &question.options {
            if option.label.trim().is_empty() {
                issues.push(format!("question {i} has an option with an empty label"));
            } else if !seen.insert(option.label.as_str()) {
                issues.push(format!(
                    "question {i} has duplicate option label {:?}",
                    option.label
                ));
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(QuestionError { issues })
    }
}

#[cfg(test)]
#[path = "question_tests.rs"]
mod tests;
