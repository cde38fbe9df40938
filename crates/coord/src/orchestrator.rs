// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `start_session` orchestrator.
//!
//! The wait is a bounded polling loop, not a filesystem watch: the answers
//! file can be written before a watch would attach (the classic creation
//! race), and polling at ~200ms sidesteps that entirely. The latency cost is
//! irrelevant — the other end of this wait is a human typing.
//!
//! On every failure path the session's status document is driven to a
//! terminal state *before* the error propagates, so an outside observer
//! never finds a permanently `pending` orphan contradicting the error the
//! caller saw.

use crate::{CoordConfig, CoordError};
use iq_core::{
    format_transcript, validate_answers, CallId, Clock, Question, SessionId, SessionState,
    SystemClock,
};
use iq_store::{SessionStore, StatusPatch, StoreError};
use std::time::Instant;
use tracing::{debug, info, warn};

/// The fixed response body for a user rejection. Rejection is a successful
/// outcome, not an error.
pub const USER_REJECTED_RESPONSE: &str =
    "User rejected this question set and chose not to provide answers.";

/// Successful result of [`Coordinator::start_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub session_id: SessionId,
    pub formatted_response: String,
}

/// How the wait loop ended.
enum WaitOutcome {
    Answered,
    Rejected,
    DeadlineExceeded,
}

/// Producer-side entry point: create a session and block on its resolution.
#[derive(Clone)]
pub struct Coordinator<C: Clock = SystemClock> {
    store: SessionStore<C>,
    config: CoordConfig,
}

impl<C: Clock> Coordinator<C> {
    pub fn new(store: SessionStore<C>, config: CoordConfig) -> Self {
        Self { store, config }
    }

    /// The underlying session store.
    pub fn store(&self) -> &SessionStore<C> {
        &self.store
    }

    /// Ask the human the given questions and wait for resolution.
    ///
    /// Returns the formatted transcript on success, the fixed rejection
    /// notice if the user declines, and errors on timeout or when the
    /// answers fail validation against the questions.
    pub async fn start_session(
        &self,
        questions: &[Question],
        call_id: Option<CallId>,
    ) -> Result<SessionOutcome, CoordError> {
        let id = self.store.create_session(questions).await?;

        if let Some(call_id) = &call_id {
            // Best effort: the session works without correlation, so a
            // failure to attach must not kill the call.
            if let Err(e) = self.store.attach_call_id(&id, call_id).await {
                warn!(session_id = %id, error = %e, "failed to attach call id, continuing");
            }
        }

        match self.wait_for_resolution(&id, call_id.as_ref()).await? {
            WaitOutcome::Rejected => {
                info!(session_id = %id, "user rejected the question set");
                Ok(SessionOutcome {
                    session_id: id,
                    formatted_response: USER_REJECTED_RESPONSE.to_string(),
                })
            }
            WaitOutcome::DeadlineExceeded => {
                self.mark(&id, SessionState::TimedOut).await;
                Err(CoordError::Timeout(id))
            }
            WaitOutcome::Answered => self.finalize(&id).await,
        }
    }

    /// The bounded polling loop: answers file (with correlation match if
    /// required) → rejected status → time budget → sleep → repeat.
    async fn wait_for_resolution(
        &self,
        id: &SessionId,
        call_id: Option<&CallId>,
    ) -> Result<WaitOutcome, CoordError> {
        let budget = self.config.wait_budget();
        let started = Instant::now();

        loop {
            if self.answers_ready(id, call_id).await? {
                return Ok(WaitOutcome::Answered);
            }

            if let Some(status) = self.store.get_session_status(id).await? {
                if status.status == SessionState::Rejected {
                    return Ok(WaitOutcome::Rejected);
                }
            }

            if let Some(budget) = budget {
                if started.elapsed() >= budget {
                    debug!(session_id = %id, waited_ms = started.elapsed().as_millis() as u64, "wait budget exhausted");
                    return Ok(WaitOutcome::DeadlineExceeded);
                }
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    /// Whether an answers file is present and, when a correlation id is
    /// required, carries the matching one. An unparseable answers file
    /// counts as ready: finalization will mark the session abandoned and
    /// surface the corruption.
    async fn answers_ready(
        &self,
        id: &SessionId,
        call_id: Option<&CallId>,
    ) -> Result<bool, CoordError> {
        if !self.store.answers_exist(id) {
            return Ok(false);
        }
        let Some(required) = call_id else {
            return Ok(true);
        };
        match self.store.get_session_answers(id).await {
            Ok(Some(answers)) => {
                let matches = answers.call_id.as_ref() == Some(required);
                if !matches {
                    debug!(
                        session_id = %id,
                        expected = %required,
                        found = ?answers.call_id,
                        "answers file has foreign call id, continuing to wait"
                    );
                }
                Ok(matches)
            }
            Ok(None) => Ok(false),
            Err(StoreError::Corrupt { .. }) => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    /// Success path: read, validate, format, finalize.
    ///
    /// The first fully-parseable answers file is final; a later overwrite is
    /// never re-read or reconciled.
    async fn finalize(&self, id: &SessionId) -> Result<SessionOutcome, CoordError> {
        let answers = match self.store.get_session_answers(id).await {
            Ok(Some(answers)) => answers,
            Ok(None) => {
                self.mark(id, SessionState::Abandoned).await;
                return Err(CoordError::AnswersNotFound(id.clone()));
            }
            Err(e @ StoreError::Corrupt { .. }) => {
                self.mark(id, SessionState::Abandoned).await;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        // Written by the same store that created the session; absence here
        // means something outside the protocol deleted it.
        let request = match self.store.get_session_request(id).await {
            Ok(Some(request)) => request,
            Ok(None) => {
                self.mark(id, SessionState::Abandoned).await;
                return Err(CoordError::RequestNotFound(id.clone()));
            }
            Err(e @ StoreError::Corrupt { .. }) => {
                self.mark(id, SessionState::Abandoned).await;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(source) = validate_answers(&answers.answers, &request.questions) {
            self.mark(id, SessionState::Abandoned).await;
            return Err(CoordError::InvalidAnswers {
                id: id.clone(),
                source,
            });
        }

        let formatted_response = format_transcript(&answers.answers, &request.questions);
        self.store
            .update_session_status(id, SessionState::Completed, StatusPatch::default())
            .await?;

        info!(session_id = %id, "session completed");
        Ok(SessionOutcome {
            session_id: id.clone(),
            formatted_response,
        })
    }

    /// Drive the status document to a terminal failure state before the
    /// error propagates. Best effort: the error about to be raised matters
    /// more than this bookkeeping.
    async fn mark(&self, id: &SessionId, state: SessionState) {
        if let Err(e) = self
            .store
            .update_session_status(id, state, StatusPatch::default())
            .await
        {
            warn!(session_id = %id, state = %state, error = %e, "failed to finalize session status");
        }
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
