// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consumer-side session discovery.
//!
//! Wraps the session store's read paths and the directory watcher into the
//! interface the interactive client needs: list pending work, load one
//! session's questions, and get notified when a new session appears.

use crate::fs_events::{self, WatchError};
use iq_core::{Clock, SessionId, SessionRequest};
use iq_store::{SessionStore, StoreError, REQUEST_FILE};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// How long to wait for `request.json` after a session directory appears.
/// The producer writes it immediately after creating the directory, so this
/// only needs to cover scheduler jitter.
const REQUEST_WAIT: Duration = Duration::from_secs(5);

/// Collapse bursts of creation events for a single directory.
const DEBOUNCE: Duration = Duration::from_millis(100);

/// A newly discovered session.
#[derive(Debug)]
pub struct NewSession {
    pub session_id: SessionId,
    pub session_path: PathBuf,
    pub timestamp: u64,
    /// The request document, if it could be loaded in time. `None` means the
    /// receiver should fall back to [`SessionWatcher::load_session`].
    pub request: Option<SessionRequest>,
}

/// Discovery interface for the interactive client.
#[derive(Clone)]
pub struct SessionWatcher<C: Clock> {
    store: SessionStore<C>,
}

impl<C: Clock> SessionWatcher<C> {
    pub fn new(store: SessionStore<C>) -> Self {
        Self { store }
    }

    /// Sessions awaiting the user, sorted for determinism.
    pub async fn list_pending_sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        self.store.list_pending_sessions().await
    }

    /// Load a session's questions.
    ///
    /// A corrupt request document is logged and reported as absent, so one
    /// bad session never breaks the client's enumeration.
    pub async fn load_session(&self, id: &SessionId) -> Result<Option<SessionRequest>, StoreError> {
        match self.store.get_session_request(id).await {
            Ok(request) => Ok(request),
            Err(StoreError::Corrupt { path, source }) => {
                warn!(
                    session_id = %id,
                    path = %path.display(),
                    error = %source,
                    "corrupt request document, treating session as absent"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Subscribe to newly appearing sessions.
    ///
    /// Spawns a background task that watches the session root and emits one
    /// [`NewSession`] per new uuid-named directory. Directories with other
    /// names are ignored. Dropping the receiver stops the task.
    pub fn subscribe(&self) -> Result<mpsc::Receiver<NewSession>, WatchError> {
        let root = self.store.config().session_dir.clone();
        // The root must exist before a watch can attach to it.
        if let Err(e) = std::fs::create_dir_all(&root) {
            warn!(root = %root.display(), error = %e, "failed to create session root");
        }
        let mut subdirs = fs_events::watch_new_subdirs(&root, DEBOUNCE)?;

        let (tx, rx) = mpsc::channel::<NewSession>(32);
        let store = self.store.clone();

        tokio::spawn(async move {
            while let Some(path) = subdirs.next().await {
                let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                let Ok(session_id) = SessionId::parse(name) else {
                    debug!(path = %path.display(), "ignoring non-session directory");
                    continue;
                };

                // The directory can appear a beat before its request document.
                let request = match fs_events::wait_for_file(&path, REQUEST_FILE, REQUEST_WAIT)
                    .await
                {
                    Ok(_) => match store.get_session_request(&session_id).await {
                        Ok(request) => request,
                        Err(e) => {
                            warn!(session_id = %session_id, error = %e, "failed to load new session request");
                            None
                        }
                    },
                    Err(e) => {
                        warn!(session_id = %session_id, error = %e, "request document never appeared");
                        None
                    }
                };

                let event = NewSession {
                    session_path: path,
                    timestamp: store.now_ms(),
                    request,
                    session_id,
                };
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(rx)
    }
}

#[cfg(test)]
#[path = "session_watcher_tests.rs"]
mod tests;
