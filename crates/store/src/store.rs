// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session store: the lifecycle state machine over session directories.
//!
//! Each session lives in `<root>/<uuid>/` with up to three documents.
//! The producer owns request/status creation; the consumer owns answers
//! creation and may mark a session rejected; deletion belongs exclusively
//! to [`SessionStore::delete_session`] and the retention sweep.
//!
//! No session state is cached in memory between calls — every read goes
//! back to disk. Simple and correct at human-speed timescales.

use crate::atomic::AtomicStore;
use crate::{StoreConfig, StoreError};
use iq_core::{
    validate_questions, Answer, CallId, Clock, Question, SessionAnswers, SessionId, SessionRequest,
    SessionState, SessionStatus, SystemClock,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Request document file name.
pub const REQUEST_FILE: &str = "request.json";
/// Status document file name.
pub const STATUS_FILE: &str = "status.json";
/// Answers document file name.
pub const ANSWERS_FILE: &str = "answers.json";

/// Session directories are owner-only.
const DIR_MODE: u32 = 0o700;
/// Documents are owner read/write.
const FILE_MODE: u32 = 0o600;

/// Optional fields merged over the status document on update.
#[derive(Debug, Default, Clone)]
pub struct StatusPatch {
    pub current_question_index: Option<usize>,
    pub call_id: Option<CallId>,
}

/// Result of [`SessionStore::validate_session`].
#[derive(Debug, Clone)]
pub struct SessionValidation {
    pub valid: bool,
    pub issues: Vec<String>,
}

/// Durable store of sessions under a root directory.
#[derive(Debug, Clone)]
pub struct SessionStore<C: Clock = SystemClock> {
    config: StoreConfig,
    files: AtomicStore,
    clock: C,
}

impl SessionStore<SystemClock> {
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> SessionStore<C> {
    pub fn with_clock(config: StoreConfig, clock: C) -> Self {
        let files = AtomicStore::new(&config);
        Self {
            config,
            files,
            clock,
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Current time from the store's clock, epoch milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.clock.epoch_ms()
    }

    pub fn session_dir(&self, id: &SessionId) -> PathBuf {
        self.config.session_dir.join(id.as_str())
    }

    fn request_path(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join(REQUEST_FILE)
    }

    fn status_path(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join(STATUS_FILE)
    }

    fn answers_path(&self, id: &SessionId) -> PathBuf {
        self.session_dir(id).join(ANSWERS_FILE)
    }

    /// Whether an answers document exists for the session.
    ///
    /// Cheaper than reading it; the orchestrator polls this.
    pub fn answers_exist(&self, id: &SessionId) -> bool {
        self.answers_path(id).exists()
    }

    /// Create a new session from a validated question list.
    ///
    /// Writes the request and status documents with matching timestamps and
    /// returns the generated identifier. The session is fully on disk before
    /// the id is returned, so a watcher can never observe a half-created
    /// session directory with a visible id.
    pub async fn create_session(&self, questions: &[Question]) -> Result<SessionId, StoreError> {
        validate_questions(questions)?;

        let id = SessionId::generate();
        let dir = self.session_dir(&id);
        fs::create_dir_all(&dir).map_err(|source| StoreError::Io {
            path: dir.clone(),
            source,
        })?;
        fs::set_permissions(&dir, fs::Permissions::from_mode(DIR_MODE)).map_err(|source| {
            StoreError::Io {
                path: dir.clone(),
                source,
            }
        })?;

        let now = self.clock.epoch_ms();
        let request = SessionRequest {
            session_id: id.clone(),
            questions: questions.to_vec(),
            status: SessionState::Pending,
            timestamp: now,
            call_id: None,
        };
        let status = SessionStatus {
            session_id: id.clone(),
            status: SessionState::Pending,
            created_at: now,
            last_modified: now,
            total_questions: questions.len(),
            current_question_index: None,
            call_id: None,
        };

        self.write_json(&self.request_path(&id), &request).await?;
        self.write_json(&self.status_path(&id), &status).await?;

        info!(session_id = %id, questions = questions.len(), "session created");
        Ok(id)
    }

    /// Attach a correlation id to an existing session's request and status.
    pub async fn attach_call_id(&self, id: &SessionId, call_id: &CallId) -> Result<(), StoreError> {
        let path = self.request_path(id);
        let Some(mut request) = self.read_json::<SessionRequest>(&path).await? else {
            return Err(StoreError::SessionNotFound(id.clone()));
        };
        request.call_id = Some(call_id.clone());
        self.write_json(&path, &request).await?;

        self.update_session_status(
            id,
            SessionState::Pending,
            StatusPatch {
                call_id: Some(call_id.clone()),
                ..StatusPatch::default()
            },
        )
        .await
    }

    pub async fn get_session_request(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionRequest>, StoreError> {
        self.read_json(&self.request_path(id)).await
    }

    pub async fn get_session_status(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionStatus>, StoreError> {
        self.read_json(&self.status_path(id)).await
    }

    pub async fn get_session_answers(
        &self,
        id: &SessionId,
    ) -> Result<Option<SessionAnswers>, StoreError> {
        self.read_json(&self.answers_path(id)).await
    }

    /// Transition the session's lifecycle state, merging `patch` over the
    /// existing status document and stamping `lastModified`.
    ///
    /// Never creates a session: a missing status document is
    /// [`StoreError::SessionNotFound`]. Transitions violating the monotonic
    /// lifecycle are rejected.
    pub async fn update_session_status(
        &self,
        id: &SessionId,
        new_state: SessionState,
        patch: StatusPatch,
    ) -> Result<(), StoreError> {
        let path = self.status_path(id);
        let Some(mut status) = self.read_json::<SessionStatus>(&path).await? else {
            return Err(StoreError::SessionNotFound(id.clone()));
        };

        if !status.status.can_transition_to(new_state) {
            return Err(StoreError::InvalidTransition {
                id: id.clone(),
                current: status.status,
                requested: new_state,
            });
        }

        debug!(session_id = %id, from = %status.status, to = %new_state, "status transition");
        status.status = new_state;
        status.last_modified = self.clock.epoch_ms();
        if let Some(index) = patch.current_question_index {
            status.current_question_index = Some(index);
        }
        if let Some(call_id) = patch.call_id {
            status.call_id = Some(call_id);
        }

        self.write_json(&path, &status).await
    }

    /// Consumer-side progress report: mark the session in progress at the
    /// given question index. Not required for completion.
    pub async fn update_progress(&self, id: &SessionId, index: usize) -> Result<(), StoreError> {
        self.update_session_status(
            id,
            SessionState::InProgress,
            StatusPatch {
                current_question_index: Some(index),
                ..StatusPatch::default()
            },
        )
        .await
    }

    /// Write the consumer's answers and mark the session completed.
    pub async fn save_session_answers(
        &self,
        id: &SessionId,
        answers: &[Answer],
        call_id: Option<&CallId>,
    ) -> Result<(), StoreError> {
        // Never implicitly create a session from an answer.
        if self.get_session_status(id).await?.is_none() {
            return Err(StoreError::SessionNotFound(id.clone()));
        }

        let doc = SessionAnswers {
            session_id: id.clone(),
            timestamp: self.clock.epoch_ms(),
            call_id: call_id.cloned(),
            answers: answers.to_vec(),
        };
        self.write_json(&self.answers_path(id), &doc).await?;
        self.update_session_status(id, SessionState::Completed, StatusPatch::default())
            .await
    }

    /// Mark the session rejected. Leaves any answers document untouched.
    pub async fn reject_session(&self, id: &SessionId) -> Result<(), StoreError> {
        self.update_session_status(id, SessionState::Rejected, StatusPatch::default())
            .await
    }

    /// Best-effort removal of all session documents and the directory.
    ///
    /// Missing files are fine; other per-document failures are logged and do
    /// not abort the directory removal. Idempotent on missing sessions.
    pub async fn delete_session(&self, id: &SessionId) -> Result<(), StoreError> {
        let dir = self.session_dir(id);

        for file in [REQUEST_FILE, STATUS_FILE, ANSWERS_FILE] {
            let path = dir.join(file);
            if let Err(e) = self.files.delete(&path).await {
                warn!(session_id = %id, path = %path.display(), error = %e, "failed to delete session document");
            }
        }

        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                debug!(session_id = %id, "session deleted");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io { path: dir, source }),
        }
    }

    /// Remove every session whose newest timestamp is past the retention
    /// window. Returns the number removed. A retention of zero disables the
    /// sweep entirely.
    ///
    /// Orthogonal to the wait timeout: a session that completed in seconds
    /// is still kept on disk until this sweep retires it.
    pub async fn cleanup_expired_sessions(&self) -> Result<usize, StoreError> {
        if self.config.retention.is_zero() {
            return Ok(0);
        }

        let cutoff = self
            .clock
            .epoch_ms()
            .saturating_sub(self.config.retention.as_millis() as u64);
        let mut removed = 0;

        for id in self.list_sessions()? {
            let status = match self.get_session_status(&id).await {
                Ok(Some(status)) => status,
                Ok(None) => {
                    debug!(session_id = %id, "skipping session without status document");
                    continue;
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "skipping unreadable session during sweep");
                    continue;
                }
            };

            let newest = status.created_at.max(status.last_modified);
            if newest < cutoff {
                if let Err(e) = self.delete_session(&id).await {
                    warn!(session_id = %id, error = %e, "failed to remove expired session");
                } else {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            info!(removed, "expired sessions cleaned up");
        }
        Ok(removed)
    }

    /// All session ids under the root, sorted. Non-session entries (names
    /// that are not a UUID) are ignored.
    pub fn list_sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        let root = &self.config.session_dir;
        if !root.exists() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(root).map_err(|source| StoreError::Io {
            path: root.clone(),
            source,
        })?;

        let mut ids = Vec::new();
        for entry in entries.flatten() {
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            if let Ok(id) = SessionId::parse(&name.to_string_lossy()) {
                ids.push(id);
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// Sessions a consumer should offer to the user: pending or in-progress,
    /// with no answers document yet. Sorted for determinism. A session whose
    /// status document is corrupt is logged and skipped so one bad session
    /// doesn't break enumeration of the rest.
    pub async fn list_pending_sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        let mut pending = Vec::new();
        for id in self.list_sessions()? {
            let status = match self.get_session_status(&id).await {
                Ok(Some(status)) => status,
                Ok(None) => continue,
                Err(StoreError::Corrupt { path, source }) => {
                    warn!(
                        session_id = %id,
                        path = %path.display(),
                        error = %source,
                        "corrupt status document, treating session as absent"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            let open = matches!(
                status.status,
                SessionState::Pending | SessionState::InProgress
            );
            if open && !self.answers_exist(&id) {
                pending.push(id);
            }
        }
        Ok(pending)
    }

    /// Diagnostic cross-document consistency check. Not on the hot path.
    pub async fn validate_session(&self, id: &SessionId) -> Result<SessionValidation, StoreError> {
        let mut issues = Vec::new();
        let dir = self.session_dir(id);

        if !dir.is_dir() {
            issues.push(format!("session directory {} does not exist", dir.display()));
            return Ok(SessionValidation {
                valid: false,
                issues,
            });
        }

        let request = self.try_load::<SessionRequest>(&self.request_path(id), &mut issues).await;
        let status = self.try_load::<SessionStatus>(&self.status_path(id), &mut issues).await;

        match &request {
            Some(request) => {
                if &request.session_id != id {
                    issues.push(format!(
                        "request sessionId {} does not match directory {}",
                        request.session_id, id
                    ));
                }
            }
            None => issues.push("request document is missing or unreadable".to_string()),
        }

        match &status {
            Some(status) => {
                if &status.session_id != id {
                    issues.push(format!(
                        "status sessionId {} does not match directory {}",
                        status.session_id, id
                    ));
                }
            }
            None => issues.push("status document is missing or unreadable".to_string()),
        }

        if let (Some(request), Some(status)) = (&request, &status) {
            if request.questions.len() != status.total_questions {
                issues.push(format!(
                    "request has {} questions but status says {}",
                    request.questions.len(),
                    status.total_questions
                ));
            }
        }

        if self.answers_exist(id) {
            if let Some(answers) = self
                .try_load::<SessionAnswers>(&self.answers_path(id), &mut issues)
                .await
            {
                if &answers.session_id != id {
                    issues.push(format!(
                        "answers sessionId {} does not match directory {}",
                        answers.session_id, id
                    ));
                }
            }
            if let Some(status) = &status {
                if !status.status.is_terminal() {
                    issues.push(format!(
                        "answers document exists but status is still {}",
                        status.status
                    ));
                }
            }
        }

        Ok(SessionValidation {
            valid: issues.is_empty(),
            issues,
        })
    }

    async fn try_load<T: DeserializeOwned>(
        &self,
        path: &Path,
        issues: &mut Vec<String>,
    ) -> Option<T> {
        match self.read_json::<T>(path).await {
            Ok(value) => value,
            Err(e) => {
                issues.push(format!("{}: {e}", path.display()));
                None
            }
        }
    }

    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Corrupt {
            path: path.to_owned(),
            source,
        })?;
        self.files.write(path, &bytes, FILE_MODE).await
    }

    /// Read and parse a JSON document. Absent file is `Ok(None)`; a file
    /// that exists but fails to parse is a hard error — "never written" and
    /// "corrupted" must stay distinguishable.
    async fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<Option<T>, StoreError> {
        let Some(bytes) = self.files.read(path).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Corrupt {
                path: path.to_owned(),
                source,
            })
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
