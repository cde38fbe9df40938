// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Store configuration.
//!
//! Constructed once at process start and passed by reference into each
//! component; there is no process-wide singleton. Tests build one with
//! [`StoreConfig::with_session_dir`] pointed at a temp directory.

use crate::StoreError;
use std::path::PathBuf;
use std::time::Duration;

/// Environment override for the session root directory.
pub const SESSION_DIR_ENV: &str = "INTERQ_SESSION_DIR";

/// How long session files are kept on disk before the retention sweep
/// removes them. Independent of the per-session wait timeout.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Default bound on acquiring a single file lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Configuration for [`crate::SessionStore`] and [`crate::AtomicStore`].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Root directory holding one subdirectory per session.
    pub session_dir: PathBuf,
    /// Retention window for the cleanup sweep; zero disables it.
    pub retention: Duration,
    /// Deadline for acquiring a file lock.
    pub lock_timeout: Duration,
    /// Retry attempts for transient read failures.
    pub read_retries: u32,
    /// Base delay for read retry backoff (doubles per attempt).
    pub retry_base_delay: Duration,
}

impl StoreConfig {
    /// Resolve the session root per-platform:
    /// `INTERQ_SESSION_DIR` > `$XDG_STATE_HOME/interq/sessions` >
    /// `~/.local/state/interq/sessions`.
    pub fn resolve() -> Result<Self, StoreError> {
        let session_dir = if let Ok(dir) = std::env::var(SESSION_DIR_ENV) {
            PathBuf::from(dir)
        } else if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
            PathBuf::from(xdg).join("interq/sessions")
        } else {
            dirs::home_dir()
                .ok_or(StoreError::NoSessionRoot)?
                .join(".local/state/interq/sessions")
        };
        Ok(Self::with_session_dir(session_dir))
    }

    /// Config rooted at an explicit directory, with default timings.
    pub fn with_session_dir(session_dir: impl Into<PathBuf>) -> Self {
        Self {
            session_dir: session_dir.into(),
            retention: DEFAULT_RETENTION,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            read_retries: 3,
            retry_base_delay: Duration::from_millis(50),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
