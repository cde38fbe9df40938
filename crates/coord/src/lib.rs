// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! iq-coord: the producer-side coordination orchestrator.
//!
//! [`Coordinator::start_session`] is the blocking, RPC-shaped entry point an
//! agent calls with a question list. It creates the session, waits for the
//! human on the other side, and returns either a formatted transcript or a
//! rejection notice — or raises on timeout and validation failure.

mod config;
mod orchestrator;

pub use config::{CoordConfig, DEFAULT_POLL_INTERVAL};
pub use orchestrator::{Coordinator, SessionOutcome, USER_REJECTED_RESPONSE};

use iq_core::{SessionId, ValidationError};
use iq_store::StoreError;
use thiserror::Error;

/// Errors from the orchestrator.
///
/// A user rejection is *not* here: rejection is a successful outcome and
/// comes back as a normal [`SessionOutcome`]. Timeout is an error, but an
/// expected one — callers wanting a retry create a new session.
#[derive(Debug, Error)]
pub enum CoordError {
    #[error("session {0} timed out waiting for a response")]
    Timeout(SessionId),
    #[error("invalid answers for session {id}: {source}")]
    InvalidAnswers {
        id: SessionId,
        #[source]
        source: ValidationError,
    },
    #[error("request not found for session {0}")]
    RequestNotFound(SessionId),
    #[error("answers not found for session {0}")]
    AnswersNotFound(SessionId),
    #[error(transparent)]
    Store(#[from] StoreError),
}
