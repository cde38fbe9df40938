// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! iq-store: durable session storage over a shared directory tree.
//!
//! Two unrelated processes rendezvous here — the producer writes requests
//! and polls status, the consumer writes answers. There is no socket and no
//! shared memory, so every correctness guarantee rests on this crate:
//! temp-write-and-rename atomicity, exclusive-create lock files with
//! stale-lock reclamation, and read retries with backoff.

mod atomic;
mod config;
mod lock;
mod store;

pub use atomic::AtomicStore;
pub use config::{StoreConfig, DEFAULT_LOCK_TIMEOUT, DEFAULT_RETENTION, SESSION_DIR_ENV};
pub use lock::{FileLock, LockError};
pub use store::{
    SessionStore, SessionValidation, StatusPatch, ANSWERS_FILE, REQUEST_FILE, STATUS_FILE,
};

use iq_core::{QuestionError, SessionId, SessionState};
use std::path::PathBuf;
use thiserror::Error;

/// Errors from store operations.
///
/// Lock trouble ([`StoreError::Lock`]) is deliberately a distinct arm from
/// missing or unreadable data, so callers can tell "the filesystem is
/// contended" apart from "the answer never came".
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Lock(#[from] LockError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read {path} after {attempts} attempts: {source}")]
    Read {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt document at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("destination already exists: {path}")]
    DestinationExists { path: PathBuf },
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),
    #[error("session {id} is {current} and cannot transition to {requested}")]
    InvalidTransition {
        id: SessionId,
        current: SessionState,
        requested: SessionState,
    },
    #[error(transparent)]
    InvalidQuestions(#[from] QuestionError),
    #[error("no home directory available to resolve the session root")]
    NoSessionRoot,
}
