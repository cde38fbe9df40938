// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! iq-core: domain types for the interq session mailbox.
//!
//! A *session* is one question-set exchange between an agent-side producer
//! and a human-side consumer, backed by a directory of JSON documents.
//! This crate holds the types those documents serialize from, the session
//! lifecycle state machine, and the pure validation/formatting routines.
//! All filesystem concerns live in `iq-store`.

pub mod clock;
pub mod document;
pub mod id;
pub mod question;
pub mod transcript;

pub use clock::{Clock, FakeClock, SystemClock};
pub use document::{Answer, SessionAnswers, SessionRequest, SessionState, SessionStatus};
pub use id::{CallId, IdError, SessionId};
pub use question::{Question, QuestionError, QuestionOption, validate_questions};
pub use transcript::{
    format_transcript, validate_answers, ValidationError, SPECIAL_REQUEST_PREFIX,
    TRANSCRIPT_HEADER,
};
