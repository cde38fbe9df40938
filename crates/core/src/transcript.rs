// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Answer validation and transcript formatting.
//!
//! Both are pure functions over `(answers, questions)`. The transcript
//! format is a compatibility surface and must not drift:
//!
//! ```text
//! Here are the user's answers:
//!
//! 1. Favorite color?
//! → Blue — The color of sky
//!
//! 3. Anything else?
//! → Other: 'no'
//! ```
//!
//! Unanswered questions are omitted entirely, not rendered as blanks.

use crate::document::Answer;
use crate::question::Question;
use thiserror::Error;

/// First line of every transcript.
pub const TRANSCRIPT_HEADER: &str = "Here are the user's answers:";

/// Custom text starting with this prefix is an out-of-band request
/// (e.g. "elaborate on question 2"), not a literal answer; it is passed
/// through to the transcript unwrapped.
pub const SPECIAL_REQUEST_PREFIX: &str = "[SPECIAL_REQUEST]";

/// Ways an answers list can fail validation against its question list.
///
/// This is the complete set; unknown extra fields and unanswered questions
/// are tolerated.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no answers were provided")]
    EmptyAnswers,
    #[error("no questions were provided")]
    EmptyQuestions,
    #[error("answer references question index {index} but only {count} questions exist")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("answer for question {index} has no selected option or custom text")]
    EmptyAnswer { index: usize },
    #[error("selected option {label:?} does not exist for question {index}")]
    UnknownOption { index: usize, label: String },
}

/// Validate answers against the questions they claim to answer.
pub fn validate_answers(answers: &[Answer], questions: &[Question]) -> Result<(), ValidationError> {
    if answers.is_empty() {
        return Err(ValidationError::EmptyAnswers);
    }
    if questions.is_empty() {
        return Err(ValidationError::EmptyQuestions);
    }

    for answer in answers {
        let index = answer.question_index;
        let Some(question) = questions.get(index) else {
            return Err(ValidationError::IndexOutOfRange {
                index,
                count: questions.len(),
            });
        };
        if answer.is_empty() {
            return Err(ValidationError::EmptyAnswer { index });
        }
        if let Some(label) = &answer.selected_option {
            check_option_exists(question, index, label)?;
        }
        if let Some(labels) = &answer.selected_options {
            for label in labels {
                check_option_exists(question, index, label)?;
            }
        }
    }

    Ok(())
}

fn check_option_exists(
    question: &Question,
    index: usize,
    label: &str,
) -> Result<(), ValidationError> {
    if question.options.iter().any(|o| o.label == label) {
        Ok(())
    } else {
        Err(ValidationError::UnknownOption {
            index,
            label: label.to_string(),
        })
    }
}

/// Render answers into the human-readable transcript.
///
/// Callers validate first; entries referencing unknown questions are
/// silently skipped here so formatting itself never fails.
pub fn format_transcript(answers: &[Answer], questions: &[Question]) -> String {
    let mut blocks = Vec::new();

    for answer in answers {
        let Some(question) = questions.get(answer.question_index) else {
            continue;
        };

        let mut lines = vec![format!("{}. {}", answer.question_index + 1, question.prompt)];

        if let Some(label) = &answer.selected_option {
            lines.push(option_line(question, label));
        }
        if let Some(labels) = &answer.selected_options {
            for label in labels {
                lines.push(option_line(question, label));
            }
        }
        if let Some(text) = &answer.custom_text {
            if text.starts_with(SPECIAL_REQUEST_PREFIX) {
                lines.push(format!("→ {text}"));
            } else {
                lines.push(format!("→ Other: '{}'", text.replace('\'', "\\'")));
            }
        }

        // Entry with no payload renders as just the numbered prompt;
        // validation rejects those before formatting on the hot path.
        blocks.push(lines.join("\n"));
    }

    format!("{TRANSCRIPT_HEADER}\n\n{}", blocks.join("\n\n"))
}

fn option_line(question: &Question, label: &str) -> String {
    let description = question
        .options
        .iter()
        .find(|o| o.label == label)
        .and_then(|o| o.description.as_deref());
    match description {
        Some(description) => format!("→ {label} — {description}"),
        None => format!("→ {label}"),
    }
}

#[cfg(test)]
#[path = "transcript_tests.rs"]
mod tests;
