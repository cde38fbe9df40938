// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! On-disk session documents and the lifecycle state machine.
//!
//! Each session directory holds up to three JSON documents:
//!
//! - `request.json` — written once at creation by the producer
//! - `status.json` — the mutable lifecycle record, rewritten on every transition
//! - `answers.json` — written once by the consumer, triggering completion
//!
//! Field names are camelCase on disk; all timestamps are epoch milliseconds.

use crate::id::{CallId, SessionId};
use crate::question::Question;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a session.
///
/// Transitions are monotonic: nothing ever returns to `Pending`, and a
/// terminal state can only be re-stamped with itself — with one exception:
/// `Completed -> Abandoned`, taken when the consumer has already marked the
/// session completed but the orchestrator then finds the answers document
/// unreadable or invalid. The filesystem record must end up matching the
/// error the orchestrator raises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Pending,
    InProgress,
    Completed,
    Rejected,
    TimedOut,
    Abandoned,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::Rejected | Self::TimedOut | Self::Abandoned
        )
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    pub fn can_transition_to(self, next: SessionState) -> bool {
        if self == next {
            // Same-state refresh (e.g. updating currentQuestionIndex, or the
            // orchestrator re-stamping Completed) is always allowed.
            return true;
        }
        match self {
            Self::Pending => next != Self::Pending,
            Self::InProgress => next.is_terminal(),
            Self::Completed => next == Self::Abandoned,
            Self::Rejected | Self::TimedOut | Self::Abandoned => false,
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
            Self::TimedOut => "timed_out",
            Self::Abandoned => "abandoned",
        };
        write!(f, "{name}")
    }
}

/// `request.json` — the immutable question set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    pub session_id: SessionId,
    pub questions: Vec<Question>,
    /// Mirror of the status at creation time; `status.json` is authoritative.
    pub status: SessionState,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,
}

/// `status.json` — the mutable lifecycle record.
///
/// Cheaper to read than the answers document; polled by the orchestrator
/// and by anyone asking "is this session still pending?".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub session_id: SessionId,
    pub status: SessionState,
    pub created_at: u64,
    pub last_modified: u64,
    pub total_questions: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_question_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,
}

/// One answer entry, referencing a question by zero-based index.
///
/// At most one of the three payload fields is set, except that
/// `custom_text` may accompany `selected_options` in multi-select mode
/// (supplementary "other" input alongside checked boxes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_option: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_text: Option<String>,
    pub timestamp: u64,
}

impl Answer {
    /// An answer with none of the payload fields carries no information.
    pub fn is_empty(&self) -> bool {
        self.selected_option.is_none()
            && self.selected_options.is_none()
            && self.custom_text.is_none()
    }
}

/// `answers.json` — the consumer's response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionAnswers {
    pub session_id: SessionId,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_id: Option<CallId>,
    pub answers: Vec<Answer>,
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
